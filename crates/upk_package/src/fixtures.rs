//! Builds small packages in memory for tests.

use flate2::{write::GzEncoder, Compression};
use tar::{Builder, EntryType, Header};

/// Writes tar entries with their names exactly as given, including `./` prefixes and trailing slashes
pub(crate) struct PackageWriter {
    builder: Builder<Vec<u8>>,
}

impl PackageWriter {
    pub fn new() -> Self {
        Self {
            builder: Builder::new(Vec::new()),
        }
    }

    fn header(name: &str, entry_type: EntryType, size: u64) -> Header {
        let mut header = Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(entry_type);
        header.set_size(size);
        header.set_mode(if entry_type.is_dir() { 0o755 } else { 0o644 });
        header.set_mtime(1_700_000_000);
        header.set_cksum();
        header
    }

    pub fn directory(mut self, name: &str) -> Self {
        let header = Self::header(&format!("{name}/"), EntryType::Directory, 0);
        self.builder.append(&header, std::io::empty()).unwrap();
        self
    }

    /// A directory entry whose name is used verbatim
    pub fn raw_directory(mut self, name: &str) -> Self {
        let header = Self::header(name, EntryType::Directory, 0);
        self.builder.append(&header, std::io::empty()).unwrap();
        self
    }

    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        let header = Self::header(name, EntryType::Regular, data.len() as u64);
        self.builder.append(&header, data).unwrap();
        self
    }

    pub fn symlink(mut self, name: &str, target: &str) -> Self {
        let mut header = Self::header(name, EntryType::Symlink, 0);
        header.set_link_name(target).unwrap();
        header.set_cksum();
        self.builder.append(&header, std::io::empty()).unwrap();
        self
    }

    /// All four members of a file asset, directory entry first
    pub fn asset(self, guid: &str, path: &str, data: &[u8]) -> Self {
        self.directory(guid)
            .file(&format!("{guid}/asset"), data)
            .file(&format!("{guid}/asset.meta"), meta(guid).as_bytes())
            .file(&format!("{guid}/pathname"), path.as_bytes())
    }

    /// A directory asset, which has no `asset` member
    pub fn folder(self, guid: &str, path: &str) -> Self {
        self.directory(guid)
            .file(&format!("{guid}/asset.meta"), meta(guid).as_bytes())
            .file(&format!("{guid}/pathname"), path.as_bytes())
    }

    pub fn finish(self) -> Vec<u8> {
        let tar = self.builder.into_inner().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        std::io::copy(&mut tar.as_slice(), &mut encoder).unwrap();
        encoder.finish().unwrap()
    }
}

/// A minimal `asset.meta` body
pub(crate) fn meta(guid: &str) -> String {
    format!("fileFormatVersion: 2\nguid: {guid}\nTextureImporter:\n  serializedVersion: 4\n")
}

/// Encodes a `width` x `height` RGBA image
pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        let pixels = (0..width * height * 4).map(|i| i as u8).collect::<Vec<_>>();
        writer.write_image_data(&pixels).unwrap();
    }
    out
}
