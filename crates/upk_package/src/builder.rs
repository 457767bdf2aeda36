//! Collects the member files of one GUID directory into an [`AssetRecord`].

use std::io::Read;
use tracing::{debug, instrument, warn};

use crate::{
    error::{Error, FormatError, Phase, Result},
    options::GuidPolicy,
    stream::{segments, RawEntry},
    types::{AssetRecord, PayloadLocation, PreviewImage},
};

/// Prefix of the line in `asset.meta` that holds the GUID
const GUID_LINE_PREFIX: &str = "guid: ";

/// Second `pathname` line some writers append
const PATHNAME_QUIRK_LINE: &str = "00";

/// The four files a GUID directory may hold
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Member {
    /// `asset`, the payload
    Asset,
    /// `asset.meta`
    AssetMeta,
    /// `pathname`
    Pathname,
    /// `preview.png`
    Preview,
}

impl Member {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "asset" => Some(Member::Asset),
            "asset.meta" => Some(Member::AssetMeta),
            "pathname" => Some(Member::Pathname),
            "preview.png" => Some(Member::Preview),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Member::Asset => "asset",
            Member::AssetMeta => "asset.meta",
            Member::Pathname => "pathname",
            Member::Preview => "preview.png",
        }
    }
}

/// A member file being handed to an [`AssetRecordBuilder`]
pub trait MemberSource: Read {
    /// Raw tar path of the member
    fn tar_path(&self) -> &str;

    /// Size of the member in bytes
    fn size(&self) -> u64;

    /// Modification time in seconds since the unix epoch
    fn mtime(&self) -> u64;
}

impl<'a, R: 'a + Read> MemberSource for RawEntry<'a, R> {
    fn tar_path(&self) -> &str {
        self.path()
    }

    fn size(&self) -> u64 {
        RawEntry::size(self)
    }

    fn mtime(&self) -> u64 {
        RawEntry::mtime(self)
    }
}

/// Accumulates the members of one GUID directory, in whatever order they arrive
#[derive(Debug)]
pub struct AssetRecordBuilder {
    guid_directory: String,
    guid_policy: GuidPolicy,
    meta_guid: Option<String>,
    virtual_path: Option<String>,
    payload: Option<PayloadLocation>,
    preview: Option<PreviewImage>,
}

impl AssetRecordBuilder {
    pub fn new(guid_directory: impl Into<String>, guid_policy: GuidPolicy) -> Self {
        Self {
            guid_directory: guid_directory.into(),
            guid_policy,
            meta_guid: None,
            virtual_path: None,
            payload: None,
            preview: None,
        }
    }

    /// The directory name, which is also the GUID of the asset
    pub fn guid_directory(&self) -> &str {
        &self.guid_directory
    }

    /// Whether no `asset` member has been added so far
    pub fn is_directory(&self) -> bool {
        self.payload.is_none()
    }

    /// Sanity check that a directory entry belongs to this builder
    pub fn assert_guid_matches_directory_name(&self, guid: &str) {
        assert_eq!(
            guid, self.guid_directory,
            "directory entry routed to the wrong builder"
        );
    }

    fn has(&self, member: Member) -> bool {
        match member {
            Member::Asset => self.payload.is_some(),
            Member::AssetMeta => self.meta_guid.is_some(),
            Member::Pathname => self.virtual_path.is_some(),
            Member::Preview => self.preview.is_some(),
        }
    }

    /// Add one member file found in this directory
    #[instrument(skip(self, entry), fields(entry = entry.tar_path()), err)]
    pub fn add_member<M: MemberSource>(&mut self, member_name: &str, entry: &mut M) -> Result<()> {
        let Some(member) = Member::from_name(member_name) else {
            return Err(FormatError::UnrecognizedMember {
                entry: entry.tar_path().to_owned(),
            }
            .into());
        };

        if self.has(member) {
            return Err(FormatError::DuplicateMember {
                entry: entry.tar_path().to_owned(),
                member: member.name(),
            }
            .into());
        }

        match member {
            Member::Asset => {
                self.payload = Some(PayloadLocation {
                    tar_path: entry.tar_path().to_owned(),
                    size: entry.size(),
                    mtime: entry.mtime(),
                });
            }
            Member::AssetMeta => {
                let guid = find_guid(entry)?;
                if guid != self.guid_directory {
                    match self.guid_policy {
                        GuidPolicy::Strict => {
                            return Err(FormatError::GuidMismatch {
                                directory: self.guid_directory.clone(),
                                meta_guid: guid,
                            }
                            .into());
                        }
                        GuidPolicy::Warn => warn!(
                            "corrupted unitypackage? directory guid {} != asset.meta guid {}",
                            self.guid_directory, guid
                        ),
                    }
                }
                self.meta_guid = Some(guid);
            }
            Member::Pathname => {
                let path = read_first_line(entry)?;
                if segments(&path).is_empty() {
                    return Err(FormatError::EmptyPathname {
                        entry: entry.tar_path().to_owned(),
                    }
                    .into());
                }
                self.virtual_path = Some(path);
            }
            Member::Preview => {
                self.preview = Some(decode_preview(entry)?);
            }
        }

        debug!("added {} to {}", member.name(), self.guid_directory);
        Ok(())
    }

    /// Turn the collected members into an immutable record
    pub fn finalize(self) -> Result<AssetRecord> {
        let Some(path) = self.virtual_path else {
            return Err(FormatError::MissingPathname {
                directory: self.guid_directory,
            }
            .into());
        };

        Ok(AssetRecord {
            path,
            directory_guid: self.guid_directory,
            meta_guid: self.meta_guid,
            payload: self.payload,
            preview: self.preview,
        })
    }
}

/// Reads a text member into lines, splitting on `\n`, `\r\n` or `\r`
fn read_lines<M: MemberSource>(entry: &mut M) -> Result<Vec<String>> {
    let mut data = Vec::new();
    entry
        .read_to_end(&mut data)
        .map_err(Error::io(Phase::Indexing, Some(entry.tar_path())))?;

    let text = String::from_utf8_lossy(&data).replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = text.split('\n').map(str::to_owned).collect::<Vec<_>>();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    Ok(lines)
}

/// Finds the `guid: ` line of `asset.meta`
///
/// The file is YAML, but Unity's flavor trips up regular parsers, so only this line is looked at.
fn find_guid<M: MemberSource>(entry: &mut M) -> Result<String> {
    let lines = read_lines(entry)?;
    lines
        .iter()
        .find_map(|line| line.strip_prefix(GUID_LINE_PREFIX))
        .map(str::to_owned)
        .ok_or_else(|| {
            FormatError::MissingGuid {
                entry: entry.tar_path().to_owned(),
                lines: lines.clone(),
            }
            .into()
        })
}

fn read_first_line<M: MemberSource>(entry: &mut M) -> Result<String> {
    let mut lines = read_lines(entry)?;
    if lines.is_empty() {
        return Err(FormatError::EmptyPathname {
            entry: entry.tar_path().to_owned(),
        }
        .into());
    }

    let quirk = lines.len() == 2 && lines[1] == PATHNAME_QUIRK_LINE;
    if lines.len() != 1 && !quirk {
        return Err(FormatError::PathnameLineCount {
            entry: entry.tar_path().to_owned(),
            lines,
        }
        .into());
    }

    Ok(lines.swap_remove(0))
}

fn decode_preview<M: MemberSource>(entry: &mut M) -> Result<PreviewImage> {
    let tar_path = entry.tar_path().to_owned();
    let invalid = |source| FormatError::InvalidPreview {
        entry: tar_path.clone(),
        source,
    };

    let mut decoder = png::Decoder::new(entry);
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info().map_err(invalid)?;

    let mut buffer = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buffer).map_err(invalid)?;
    buffer.truncate(info.buffer_size());

    let rgba = match info.color_type {
        png::ColorType::Rgba => buffer,
        png::ColorType::Rgb => buffer
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
            .collect(),
        png::ColorType::GrayscaleAlpha => buffer
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale | png::ColorType::Indexed => buffer
            .iter()
            .flat_map(|&g| [g, g, g, u8::MAX])
            .collect(),
    };

    Ok(PreviewImage {
        width: info.width,
        height: info.height,
        rgba,
    })
}
