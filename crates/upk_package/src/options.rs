//! Options controlling how a package is indexed

use bon::Builder;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// What to do when the GUID in `asset.meta` differs from its directory name
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum GuidPolicy {
    /// Log the mismatch and keep the directory name as the GUID
    #[default]
    Warn,

    /// Fail indexing with [`crate::error::FormatError::GuidMismatch`]
    Strict,
}

/// Shared count of tar entries seen by a running index
///
/// Clone it before handing the options to the indexer and poll [`IndexProgress::entries_seen`]
/// from another thread.
#[derive(Debug, Clone, Default)]
pub struct IndexProgress(Arc<AtomicUsize>);

impl IndexProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries_seen(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn advance(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// Options for how a package should be indexed
///
/// ```
/// use upk_package::{GuidPolicy, IndexOptions, IndexProgress};
///
/// let progress = IndexProgress::new();
/// let options = IndexOptions::builder()
///     .guid_policy(GuidPolicy::Strict)
///     .progress(progress.clone())
///     .build();
///
/// assert_eq!(options.guid_policy, GuidPolicy::Strict);
/// assert_eq!(progress.entries_seen(), 0);
/// ```
#[derive(Debug, Clone, Default, Builder)]
pub struct IndexOptions {
    /// How a GUID mismatch between a directory and its `asset.meta` is handled
    #[builder(default)]
    pub guid_policy: GuidPolicy,

    /// Counter advanced once per tar entry
    pub progress: Option<IndexProgress>,
}
