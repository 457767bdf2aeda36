//! Forward-only access to the tar entries inside the gzip stream.

use flate2::read::GzDecoder;
use std::{
    fmt::{self, Debug},
    io::{self, Read},
};
use tar::{Archive, Entries, Entry, EntryType};
use tracing::trace;

use crate::error::{Error, FormatError, Phase, Result};

/// Whether a tar entry is a directory marker or a file
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// Splits a slash delimited path into its non-empty segments
pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A gzip compressed tar stream read from the start
///
/// The stream can only move forward. Every pass over a package opens a new one.
pub struct PackageStream<R: Read> {
    archive: Archive<GzDecoder<R>>,
    phase: Phase,
}

impl<R: Read> PackageStream<R> {
    pub fn new(reader: R, phase: Phase) -> Self {
        Self {
            archive: Archive::new(GzDecoder::new(reader)),
            phase,
        }
    }

    /// Iterate the entries in stream order
    ///
    /// Each [`RawEntry`] has to be read before the next one is requested, its bytes are gone afterwards.
    pub fn entries(&mut self) -> Result<RawEntries<'_, R>> {
        let phase = self.phase;
        let inner = self.archive.entries().map_err(Error::io(phase, None))?;
        Ok(RawEntries {
            inner,
            phase,
            last: None,
        })
    }

    /// Unwrap the decompressed stream, positioned right after the last header read
    ///
    /// If the last entry handed out was not read, this is the start of its data.
    pub fn into_inner(self) -> GzDecoder<R> {
        self.archive.into_inner()
    }
}

/// Iterator over the entries of a [`PackageStream`]
pub struct RawEntries<'a, R: 'a + Read> {
    inner: Entries<'a, GzDecoder<R>>,
    phase: Phase,
    last: Option<String>,
}

impl<'a, R: 'a + Read> RawEntries<'a, R> {
    /// `old_header` is set for pre-ustar headers, which mark directories only by a trailing `/`
    fn classify(&self, path: &str, entry_type: EntryType, old_header: bool) -> Result<Option<EntryKind>> {
        if entry_type.is_pax_global_extensions() {
            trace!("skipping global pax header {}", path);
            return Ok(None);
        }

        if entry_type.is_dir() || (old_header && entry_type.is_file() && path.ends_with('/')) {
            Ok(Some(EntryKind::Directory))
        } else if entry_type.is_file() || entry_type.is_contiguous() {
            Ok(Some(EntryKind::File))
        } else {
            Err(FormatError::UnsupportedEntry {
                entry: path.to_owned(),
                kind: format!("{:?}", entry_type),
            }
            .into())
        }
    }

    fn next_entry(&mut self) -> Result<Option<RawEntry<'a, R>>> {
        loop {
            let Some(entry) = self.inner.next() else {
                return Ok(None);
            };
            let entry = entry.map_err(Error::io(self.phase, self.last.as_deref()))?;

            let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let header = entry.header();
            let old_header = header.as_ustar().is_none();
            let Some(kind) = self.classify(&path, header.entry_type(), old_header)? else {
                continue;
            };

            let mtime = entry
                .header()
                .mtime()
                .map_err(Error::io(self.phase, Some(&path)))?;
            self.last = Some(path.clone());

            return Ok(Some(RawEntry {
                size: entry.size(),
                path,
                kind,
                mtime,
                inner: entry,
            }));
        }
    }
}

impl<'a, R: 'a + Read> Iterator for RawEntries<'a, R> {
    type Item = Result<RawEntry<'a, R>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

/// A single tar entry, readable until the next entry is requested
pub struct RawEntry<'a, R: 'a + Read> {
    path: String,
    kind: EntryKind,
    size: u64,
    mtime: u64,
    inner: Entry<'a, GzDecoder<R>>,
}

impl<'a, R: 'a + Read> Debug for RawEntry<'a, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RawEntry")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("mtime", &self.mtime)
            .finish()
    }
}

impl<'a, R: 'a + Read> RawEntry<'a, R> {
    /// Raw tar path of the entry
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Size of the entry data in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time in seconds since the unix epoch
    pub fn mtime(&self) -> u64 {
        self.mtime
    }
}

impl<'a, R: 'a + Read> Read for RawEntry<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use std::io::Read;

    use super::{segments, EntryKind, PackageStream};
    use crate::{
        error::{Error, FormatError, Phase, Result},
        fixtures::PackageWriter,
    };

    #[test]
    fn segments_drop_empty_parts() {
        assert_eq!(segments("abc/"), vec!["abc"]);
        assert_eq!(segments("./abc//asset"), vec![".", "abc", "asset"]);
        assert_eq!(segments(""), Vec::<&str>::new());
    }

    #[test]
    fn entries_in_stream_order() -> Result<()> {
        let bytes = PackageWriter::new()
            .directory("0123")
            .file("0123/pathname", b"Assets/a.txt")
            .file("0123/asset", b"hello")
            .finish();

        let mut stream = PackageStream::new(bytes.as_slice(), Phase::Indexing);
        let mut seen = Vec::new();
        for entry in stream.entries()? {
            let mut entry = entry?;
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            seen.push((entry.path().to_owned(), entry.kind(), entry.size(), data));
        }

        assert_eq!(
            seen,
            vec![
                ("0123/".to_owned(), EntryKind::Directory, 0, vec![]),
                ("0123/pathname".to_owned(), EntryKind::File, 12, b"Assets/a.txt".to_vec()),
                ("0123/asset".to_owned(), EntryKind::File, 5, b"hello".to_vec()),
            ]
        );

        Ok(())
    }

    #[test]
    fn trailing_slash_marks_old_directory() -> Result<()> {
        let bytes = PackageWriter::new()
            .file("0123/", b"")
            .file("0123/asset", b"hello")
            .finish();

        let mut stream = PackageStream::new(bytes.as_slice(), Phase::Indexing);
        let kinds = stream
            .entries()?
            .map(|e| e.map(|e| (e.path().to_owned(), e.kind())))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(
            kinds,
            vec![
                ("0123/".to_owned(), EntryKind::Directory),
                ("0123/asset".to_owned(), EntryKind::File),
            ]
        );

        Ok(())
    }

    #[test]
    fn symlinks_are_unsupported() -> Result<()> {
        let bytes = PackageWriter::new()
            .symlink("0123/asset", "../elsewhere")
            .finish();

        let mut stream = PackageStream::new(bytes.as_slice(), Phase::Indexing);
        let result = stream.entries()?.next();
        assert!(matches!(
            result,
            Some(Err(Error::Format(FormatError::UnsupportedEntry { .. })))
        ));

        Ok(())
    }

    #[test]
    fn truncated_stream_reports_phase() {
        let mut bytes = PackageWriter::new()
            .file("0123/pathname", b"Assets/a.txt")
            .finish();
        bytes.truncate(bytes.len() / 2);

        let mut stream = PackageStream::new(bytes.as_slice(), Phase::Extracting);
        let failure = stream
            .entries()
            .and_then(|entries| entries.map(|e| e.map(|_| ())).collect::<Result<Vec<_>>>())
            .err();

        assert!(matches!(
            failure,
            Some(Error::Io {
                phase: Phase::Extracting,
                ..
            })
        ));
    }
}
