//! Sources a package can be read from, any number of times.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
};

/// File extension of unitypackage archives
pub const EXTENSION: &str = "unitypackage";

/// A package that can be re-opened from its first byte
///
/// Indexing and every extraction each open their own reader, so no cursor is ever shared.
pub trait PackageSource {
    type Reader<'a>: Read
    where
        Self: 'a;

    /// Open a new reader positioned at the start of the package
    fn open(&self) -> io::Result<Self::Reader<'_>>;
}

impl PackageSource for PathBuf {
    type Reader<'a> = BufReader<File>
    where
        Self: 'a;

    fn open(&self) -> io::Result<Self::Reader<'_>> {
        File::open(self).map(BufReader::new)
    }
}

impl PackageSource for Vec<u8> {
    type Reader<'a> = &'a [u8]
    where
        Self: 'a;

    fn open(&self) -> io::Result<Self::Reader<'_>> {
        Ok(self.as_slice())
    }
}

impl<'s> PackageSource for &'s [u8] {
    type Reader<'a> = &'s [u8]
    where
        Self: 'a;

    fn open(&self) -> io::Result<Self::Reader<'_>> {
        Ok(*self)
    }
}

/// Whether `path` carries the `.unitypackage` extension, in any case
pub fn is_unitypackage(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXTENSION))
}
