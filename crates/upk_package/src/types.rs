//! Immutable records produced by indexing a package.

use chrono::{DateTime, Utc};
use std::{
    fmt::{self, Debug},
    path::{Component, Path, PathBuf},
};

/// Where the `asset` member of a GUID directory lives in the tar stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadLocation {
    /// Raw tar path of the `asset` entry, as it appears in the stream
    pub tar_path: String,
    /// Size of the payload in bytes
    pub size: u64,
    /// Modification time in seconds since the unix epoch
    pub mtime: u64,
}

/// A decoded `preview.png`, normalized to 8-bit RGBA
#[derive(Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    /// Row-major pixels, four bytes each
    pub rgba: Vec<u8>,
}

impl Debug for PreviewImage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PreviewImage({}x{})", self.width, self.height)
    }
}

/// An asset as it appears once the package is imported. This could be a directory or a file.
///
/// Records are created by [`crate::builder::AssetRecordBuilder::finalize`] and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub(crate) path: String,
    pub(crate) directory_guid: String,
    pub(crate) meta_guid: Option<String>,
    pub(crate) payload: Option<PayloadLocation>,
    pub(crate) preview: Option<PreviewImage>,
}

impl AssetRecord {
    /// Get the full virtual path of the asset
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this path directly when extracting a package.
    /// It may contain an absolute path (`/etc/shadow`), or break out of the
    /// current directory (`../runtime`). Use [`AssetRecord::enclosed_path`]
    /// when writing to disk.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Segments of the virtual path, skipping empty ones
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment of the virtual path
    pub fn file_name(&self) -> &str {
        self.segments().next_back().unwrap_or_default()
    }

    /// The virtual path as a relative path, if it stays below the directory it is joined to
    pub fn enclosed_path(&self) -> Option<PathBuf> {
        let mut enclosed = PathBuf::new();
        for component in Path::new(&self.path).components() {
            match component {
                Component::Normal(part) => enclosed.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if enclosed.as_os_str().is_empty() {
            None
        } else {
            Some(enclosed)
        }
    }

    /// The GUID of the asset, taken from its directory name
    pub fn guid(&self) -> &str {
        &self.directory_guid
    }

    /// The GUID found in `asset.meta`, if the member was present
    pub fn meta_guid(&self) -> Option<&str> {
        self.meta_guid.as_deref()
    }

    /// Whether the GUID in `asset.meta` disagrees with the directory name
    pub fn has_guid_mismatch(&self) -> bool {
        self.meta_guid
            .as_deref()
            .is_some_and(|guid| guid != self.directory_guid)
    }

    /// Directories have no `asset` member
    pub fn is_directory(&self) -> bool {
        self.payload.is_none()
    }

    /// Location of the payload in the tar stream, for file records
    pub fn payload(&self) -> Option<&PayloadLocation> {
        self.payload.as_ref()
    }

    /// Size of the payload in bytes, for file records
    pub fn size(&self) -> Option<u64> {
        self.payload.as_ref().map(|p| p.size)
    }

    /// Modification time of the payload, for file records
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.payload
            .as_ref()
            .and_then(|p| i64::try_from(p.mtime).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn preview(&self) -> Option<&PreviewImage> {
        self.preview.as_ref()
    }
}

/// Formats a byte count with `,` thousands separators
pub(crate) fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
