//! Error types that can be emitted from this library

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// I/O failure with the phase and tar entry it happened in
    #[error("i/o failure while {phase}{}", .entry.as_ref().map(|e| format!(" {e}")).unwrap_or_default())]
    Io {
        phase: Phase,
        entry: Option<String>,
        #[source]
        source: std::io::Error,
    },

    /// The archive contents are malformed or unsupported
    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    /// A payload could not be extracted
    #[error(transparent)]
    #[diagnostic(transparent)]
    Extraction(#[from] ExtractionError),
}

impl Error {
    /// Wraps an I/O failure with the phase and tar entry it happened in
    pub(crate) fn io(phase: Phase, entry: Option<&str>) -> impl FnOnce(std::io::Error) -> Error + '_ {
        move |source| Error::Io {
            phase,
            entry: entry.map(str::to_owned),
            source,
        }
    }
}

/// The operation an I/O failure interrupted
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Indexing,
    Extracting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Indexing => f.write_str("indexing"),
            Phase::Extracting => f.write_str("extracting"),
        }
    }
}

/// Malformed or unsupported archive contents. Any of these aborts the whole index.
#[derive(Error, Diagnostic, Debug)]
pub enum FormatError {
    /// A root level entry other than `.` or `.icon.png`
    #[error("unexpected root-level entry {entry:?}")]
    UnexpectedRootEntry { entry: String },

    /// A directory below a GUID directory, or a file below one
    #[error("nested directory not supported: {entry:?}")]
    #[diagnostic(help("unitypackage archives only hold one level of GUID directories"))]
    NestedDirectory { entry: String },

    /// A tar entry that is neither a regular file nor a directory
    #[error("unsupported {kind} entry {entry:?}")]
    UnsupportedEntry { entry: String, kind: String },

    /// A member file name that is not one of the four known ones
    #[error("unrecognized member name {entry:?}")]
    #[diagnostic(help("expected one of asset, asset.meta, pathname or preview.png"))]
    UnrecognizedMember { entry: String },

    /// The same member appeared twice in one GUID directory
    #[error("duplicate {member} member {entry:?}")]
    DuplicateMember { entry: String, member: &'static str },

    /// `asset.meta` has no `guid: ` line
    #[error("{entry}: couldn't find GUID among the {} lines: {lines:?}", .lines.len())]
    MissingGuid { entry: String, lines: Vec<String> },

    /// `pathname` has no lines at all
    #[error("{entry}: file is empty")]
    EmptyPathname { entry: String },

    /// `pathname` has more than one line and is not the `00` quirk
    #[error("{entry}: file expected to have 1 line, but found {} lines: {lines:?}", .lines.len())]
    PathnameLineCount { entry: String, lines: Vec<String> },

    /// `preview.png` could not be decoded
    #[error("{entry}: unable to decode preview image")]
    InvalidPreview {
        entry: String,
        #[source]
        source: png::DecodingError,
    },

    /// The GUID in `asset.meta` differs from its directory, under [`crate::GuidPolicy::Strict`]
    #[error("corrupted unitypackage? directory guid {directory} != asset.meta guid {meta_guid}")]
    GuidMismatch { directory: String, meta_guid: String },

    /// A GUID directory never received a `pathname` member
    #[error("{directory}: no pathname member")]
    MissingPathname { directory: String },

    /// Two records claim the same tree node, or a file sits where a directory is needed
    #[error("path collision between {kind} at {path:?}")]
    PathCollision { path: String, kind: Collision },
}

/// What two records claiming the same tree node are
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Collision {
    Files,
    Directories,
    FileAndDirectory,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collision::Files => f.write_str("two files"),
            Collision::Directories => f.write_str("two directories"),
            Collision::FileAndDirectory => f.write_str("file and directory"),
        }
    }
}

/// Error type to provide further information when a payload can not be extracted
#[derive(Error, Diagnostic, Debug)]
pub enum ExtractionError {
    /// The payload entry was not found when re-scanning the archive
    #[error("could not find asset {virtual_path} ({tar_path}); the archive changed since it was indexed")]
    NotFound {
        tar_path: String,
        virtual_path: String,
    },

    /// Directory records carry no payload
    #[error("{virtual_path} is a directory and has no payload")]
    IsDirectory { virtual_path: String },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
