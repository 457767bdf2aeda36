//! Types for indexing unitypackage archives
//!

use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    io::Read,
    sync::Arc,
};
use tracing::{debug, instrument, trace};

use crate::{
    builder::AssetRecordBuilder,
    error::{Error, FormatError, Phase, Result},
    extract::{self, PayloadReader},
    options::IndexOptions,
    source::PackageSource,
    stream::{segments, EntryKind, PackageStream},
    tree::{self, PathTreeNode},
    types::AssetRecord,
};

/// Root directory some writers nest everything under
const DOT_ROOT: &str = ".";

/// Package icon stored next to the GUID directories
const ROOT_ICON: &str = ".icon.png";

/// Index a package in one forward pass over `reader`
///
/// Records come back ordered by their GUID directory name. Payload bytes are skipped, only their
/// location and size are kept.
#[instrument(skip_all, err)]
pub fn index<R: Read>(reader: R, options: &IndexOptions) -> Result<Vec<Arc<AssetRecord>>> {
    let mut stream = PackageStream::new(reader, Phase::Indexing);
    let mut builders: BTreeMap<String, AssetRecordBuilder> = BTreeMap::new();
    let mut has_dot_root = false;

    for entry in stream.entries()? {
        let mut entry = entry?;
        if let Some(progress) = &options.progress {
            progress.advance();
        }

        let raw_path = entry.path().to_owned();
        let mut parts = segments(&raw_path);

        if entry.is_directory() && parts == [DOT_ROOT] {
            trace!("found {} root directory", DOT_ROOT);
            has_dot_root = true;
            continue;
        }

        if has_dot_root && parts.first() == Some(&DOT_ROOT) {
            parts.remove(0);
        }

        match (parts.as_slice(), entry.kind()) {
            ([name], EntryKind::File) if *name == ROOT_ICON => {
                debug!("skipping package icon {}", raw_path);
            }
            ([guid], EntryKind::Directory) => {
                builders
                    .entry((*guid).to_owned())
                    .or_insert_with(|| AssetRecordBuilder::new(*guid, options.guid_policy))
                    .assert_guid_matches_directory_name(guid);
            }
            ([guid, member], EntryKind::File) => {
                builders
                    .entry((*guid).to_owned())
                    .or_insert_with(|| AssetRecordBuilder::new(*guid, options.guid_policy))
                    .add_member(member, &mut entry)?;
            }
            ([] | [_], _) => {
                return Err(FormatError::UnexpectedRootEntry { entry: raw_path }.into());
            }
            _ => {
                return Err(FormatError::NestedDirectory { entry: raw_path }.into());
            }
        }
    }

    let records = builders
        .into_values()
        .map(|builder| builder.finalize().map(Arc::new))
        .collect::<Result<Vec<_>>>()?;

    debug!("indexed {} assets", records.len());
    Ok(records)
}

/// An indexed unitypackage
///
/// ```no_run
/// use std::path::PathBuf;
///
/// fn list_package_contents(path: PathBuf) -> upk_package::error::Result<()> {
///     let package = upk_package::UnityPackage::new(path)?;
///
///     for record in package.records().iter().filter(|r| !r.is_directory()) {
///         println!("Asset: {}", record.path());
///         let mut payload = package.open_payload(record)?;
///         std::io::copy(&mut payload, &mut std::io::stdout())?;
///     }
///
///     Ok(())
/// }
/// ```
pub struct UnityPackage<S> {
    source: S,
    records: Vec<Arc<AssetRecord>>,
}

impl<S> Debug for UnityPackage<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UnityPackage({} assets)", self.records.len())
    }
}

impl<S> UnityPackage<S> {
    /// Number of assets in the package, directories included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether this package contains no assets
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, ordered by GUID directory name
    pub fn records(&self) -> &[Arc<AssetRecord>] {
        &self.records
    }

    /// Number of records that carry a payload
    pub fn file_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_directory()).count()
    }

    /// Total size of all payloads, if it fits
    pub fn total_payload_size(&self) -> Option<u128> {
        let mut total = 0u128;
        for size in self.records.iter().filter_map(|r| r.size()) {
            total = total.checked_add(size as u128)?;
        }
        Some(total)
    }

    /// Look up a record by the GUID of its directory
    pub fn by_guid(&self, guid: &str) -> Option<&Arc<AssetRecord>> {
        self.records
            .binary_search_by(|r| r.guid().cmp(guid))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Look up a record by its virtual path
    pub fn by_path(&self, path: &str) -> Option<&Arc<AssetRecord>> {
        self.records.iter().find(|r| r.path() == path)
    }

    /// Build the directory tree implied by the virtual paths
    pub fn build_tree(&self) -> Result<PathTreeNode> {
        tree::build_tree(&self.records)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Unwrap and return the source
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: PackageSource> UnityPackage<S> {
    /// Index a package with the default options
    pub fn new(source: S) -> Result<UnityPackage<S>> {
        Self::with_options(source, &IndexOptions::default())
    }

    /// Index a package
    pub fn with_options(source: S, options: &IndexOptions) -> Result<UnityPackage<S>> {
        let records = {
            let reader = source.open().map_err(Error::io(Phase::Indexing, None))?;
            index(reader, options)?
        };

        Ok(UnityPackage { source, records })
    }

    /// Open a stream over the payload of `record`
    ///
    /// Every call scans the package again from the start.
    pub fn open_payload(&self, record: &AssetRecord) -> Result<PayloadReader<S::Reader<'_>>> {
        let entry = record.payload().map(|p| p.tar_path.as_str());
        let reader = self
            .source
            .open()
            .map_err(Error::io(Phase::Extracting, entry))?;
        extract::open_payload(record, reader)
    }

    /// Stream every payload in the package during a single scan
    pub fn for_each_payload<F>(&self, visit: F) -> Result<usize>
    where
        F: FnMut(&Arc<AssetRecord>, &mut dyn Read) -> Result<()>,
    {
        let reader = self
            .source
            .open()
            .map_err(Error::io(Phase::Extracting, None))?;
        extract::for_each_payload(reader, &self.records, visit)
    }
}
