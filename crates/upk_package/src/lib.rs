//! This library handles indexing and extracting **.unitypackage** files.
//!
//! # Unitypackage Archive Format Documentation
//!
//! A `.unitypackage` is a gzip compressed tar stream. The tar holds a flat list of directories, one per
//! asset, each named after the asset's GUID. Nothing in the tar is nested deeper than one directory.
//!
//! ## File Structure
//!
//! | Tar path              | Kind      | Description                                                   |
//! |-----------------------|-----------|---------------------------------------------------------------|
//! | `.`                   | Directory | Optional: every following path is prefixed with `./`          |
//! | `.icon.png`           | File      | Optional: package icon, ignored                               |
//! | `<GUID>/`             | Directory | Optional: marks the asset directory                           |
//! | `<GUID>/pathname`     | File      | Path the asset is imported at                                 |
//! | `<GUID>/asset.meta`   | File      | Metadata, holds a `guid: <GUID>` line                         |
//! | `<GUID>/asset`        | File      | Optional: payload. Directories have none                      |
//! | `<GUID>/preview.png`  | File      | Optional: preview image                                       |
//!
//! ### Members
//!
//! - **pathname**: A single line holding the virtual path of the asset, for example
//!   `Assets/Textures/wood.png`. Some writers append a second line containing exactly `00`, which is ignored.
//! - **asset.meta**: Line oriented text. The first line starting with `guid: ` carries the GUID of the asset.
//!   It should match the directory name; the directory name wins when it does not.
//! - **asset**: The raw payload. It is never interpreted, only measured and streamed.
//! - **preview.png**: A PNG image decoded while indexing.
//!
//! Entries may appear in any order. A directory entry can come before or after the files inside it, or be
//! missing entirely.
//!
//! ## Reading
//!
//! Indexing makes one forward pass over the stream and keeps only the location and size of each payload.
//! Extracting a payload re-opens the source and scans forward to the matching entry, since a gzip stream
//! cannot be seeked.
//!
//! ```no_run
//! use std::path::PathBuf;
//! use upk_package::{search::SearchIndex, UnityPackage};
//!
//! fn list_package(path: PathBuf) -> upk_package::error::Result<()> {
//!     let package = UnityPackage::new(path)?;
//!     let tree = package.build_tree()?;
//!
//!     for entry in SearchIndex::new(&tree).search("wood") {
//!         println!("{}", entry);
//!         let mut payload = package.open_payload(entry.record())?;
//!         std::io::copy(&mut payload, &mut std::io::sink())?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Additional Information
//!
//! - **File Extension**: `.unitypackage`
//! - **Path Separator**: `/`
//! - **Text Encoding**: UTF-8
//!

pub mod builder;
pub mod error;
pub mod extract;
pub mod options;
pub mod read;
pub mod search;
pub mod source;
pub mod stream;
pub mod tree;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use options::{GuidPolicy, IndexOptions, IndexProgress};
pub use read::UnityPackage;
pub use source::{is_unitypackage, PackageSource};
pub use tree::{build_tree, PathTreeNode};
pub use types::AssetRecord;
