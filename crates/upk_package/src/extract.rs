//! Streaming payloads back out of a package

use flate2::read::GzDecoder;
use std::{
    collections::HashMap,
    fmt::{self, Debug},
    io::{self, Read},
    sync::Arc,
};
use tracing::{instrument, trace, warn};

use crate::{
    error::{ExtractionError, Phase, Result},
    stream::PackageStream,
    types::AssetRecord,
};

/// A stream over one payload, positioned inside the decompressed package
pub struct PayloadReader<R: Read> {
    inner: io::Take<GzDecoder<R>>,
    size: u64,
}

impl<R: Read> Debug for PayloadReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PayloadReader({} bytes)", self.size)
    }
}

impl<R: Read> PayloadReader<R> {
    /// Size of the payload in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes not read yet
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }
}

impl<R: Read> Read for PayloadReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Scan `reader` from the start up to the payload of `record`
///
/// `reader` must be the package `record` was indexed from. Failing to find the payload means the
/// package changed in between.
#[instrument(skip_all, fields(path = record.path()), err)]
pub fn open_payload<R: Read>(record: &AssetRecord, reader: R) -> Result<PayloadReader<R>> {
    let Some(location) = record.payload() else {
        return Err(ExtractionError::IsDirectory {
            virtual_path: record.path().to_owned(),
        }
        .into());
    };

    let mut stream = PackageStream::new(reader, Phase::Extracting);
    let mut found = None;
    for entry in stream.entries()? {
        let entry = entry?;
        if entry.path() == location.tar_path {
            found = Some(entry.size());
            break;
        }
    }

    let Some(size) = found else {
        return Err(ExtractionError::NotFound {
            tar_path: location.tar_path.clone(),
            virtual_path: record.path().to_owned(),
        }
        .into());
    };

    if size != location.size {
        warn!(
            "{} is {} bytes, but was {} bytes when indexed",
            location.tar_path, size, location.size
        );
    }

    trace!("found {} ({} bytes)", location.tar_path, size);
    Ok(PayloadReader {
        inner: stream.into_inner().take(size),
        size,
    })
}

/// Hand every payload in `records` to `visit` while scanning `reader` once
///
/// Payloads are visited in stream order. Returns the number of payloads visited.
#[instrument(skip_all, fields(records = records.len()), err)]
pub fn for_each_payload<R, F>(reader: R, records: &[Arc<AssetRecord>], mut visit: F) -> Result<usize>
where
    R: Read,
    F: FnMut(&Arc<AssetRecord>, &mut dyn Read) -> Result<()>,
{
    let mut pending = records
        .iter()
        .filter_map(|r| r.payload().map(|p| (p.tar_path.as_str(), r)))
        .collect::<HashMap<_, _>>();

    let mut stream = PackageStream::new(reader, Phase::Extracting);
    let mut visited = 0;
    for entry in stream.entries()? {
        let mut entry = entry?;
        if let Some(record) = pending.remove(entry.path()) {
            trace!("visiting {}", record.path());
            visit(record, &mut entry)?;
            visited += 1;
        }
    }

    if let Some(record) = pending.into_values().min_by_key(|r| r.path()) {
        return Err(ExtractionError::NotFound {
            tar_path: record
                .payload()
                .map(|p| p.tar_path.clone())
                .unwrap_or_default(),
            virtual_path: record.path().to_owned(),
        }
        .into());
    }

    Ok(visited)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use std::io::Read;

    use super::{for_each_payload, open_payload};
    use crate::{
        error::{Error, ExtractionError, Result},
        fixtures::{png, PackageWriter},
        read::UnityPackage,
    };

    fn package() -> Result<UnityPackage<Vec<u8>>> {
        let bytes = PackageWriter::new()
            .folder("bbbb", "Assets")
            .asset("aaaa", "Assets/a.txt", b"first payload")
            .file("aaaa/preview.png", &png(4, 4))
            .asset("cccc", "Assets/c.bin", &[7u8; 3000])
            .finish();
        UnityPackage::new(bytes)
    }

    #[test]
    fn payload_length_matches_record() -> Result<()> {
        let package = package()?;
        for record in package.records().iter().filter(|r| !r.is_directory()) {
            let mut payload = package.open_payload(record)?;
            assert_eq!(Some(payload.size()), record.size());

            let mut data = Vec::new();
            payload.read_to_end(&mut data)?;
            assert_eq!(Some(data.len() as u64), record.size());
            assert_eq!(payload.remaining(), 0);
        }
        Ok(())
    }

    #[test]
    fn payload_bytes_are_exact() -> Result<()> {
        let package = package()?;
        let record = package.by_path("Assets/a.txt").expect("indexed");

        let mut data = String::new();
        package.open_payload(record)?.read_to_string(&mut data)?;
        assert_eq!(data, "first payload");

        Ok(())
    }

    #[test]
    fn directories_have_no_payload() -> Result<()> {
        let package = package()?;
        let folder = package.by_guid("bbbb").expect("indexed");
        assert!(matches!(
            package.open_payload(folder),
            Err(Error::Extraction(ExtractionError::IsDirectory { .. }))
        ));
        Ok(())
    }

    #[test]
    fn changed_package_reports_not_found() -> Result<()> {
        let package = package()?;
        let record = package.by_path("Assets/a.txt").expect("indexed");

        let other = PackageWriter::new().asset("dddd", "Assets/d.txt", b"d").finish();
        assert!(matches!(
            open_payload(record, other.as_slice()),
            Err(Error::Extraction(ExtractionError::NotFound { .. }))
        ));
        assert!(matches!(
            for_each_payload(other.as_slice(), package.records(), |_, _| Ok(())),
            Err(Error::Extraction(ExtractionError::NotFound { .. }))
        ));

        Ok(())
    }

    #[test]
    fn single_scan_visits_every_payload() -> Result<()> {
        let package = package()?;

        let mut seen = Vec::new();
        let visited = package.for_each_payload(|record, payload| {
            let mut data = Vec::new();
            payload.read_to_end(&mut data)?;
            seen.push((record.path().to_owned(), data.len()));
            Ok(())
        })?;

        assert_eq!(visited, 2);
        assert_eq!(
            seen,
            vec![
                ("Assets/a.txt".to_owned(), 13),
                ("Assets/c.bin".to_owned(), 3000),
            ]
        );

        Ok(())
    }

    #[test]
    fn extraction_leaves_index_untouched() -> Result<()> {
        let package = package()?;
        let before = package.records().to_vec();

        let other = PackageWriter::new().finish();
        let record = package.by_path("Assets/c.bin").expect("indexed");
        assert!(open_payload(record, other.as_slice()).is_err());
        assert_eq!(package.records(), before.as_slice());

        Ok(())
    }
}
