//! Error types for data source construction and file reads.
//!
//! Construction failures are fatal to the [`DataSource`](crate::DataSource)
//! being built. Read failures are raised per call and leave the backend and
//! its index intact, so callers may retry or treat the file as missing.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceMode;

/// Failure while building a data source.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("invalid magic path '{0}'")]
    InvalidPath(String),

    #[error("magic path '{path}' can't be opened in {mode:?} mode")]
    InvalidMode { path: String, mode: SourceMode },

    #[error("unknown file extension '{ext}' of data pack '{path}'")]
    UnknownExtension { ext: String, path: String },

    #[error("data pack '{0}' not found")]
    PackNotFound(String),

    #[error("can't open archive '{path}'")]
    ArchiveOpen {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("corrupt archive tree in '{path}': {reason}")]
    CorruptTree { path: String, reason: String },

    #[error("archive '{path}' is truncated: header says {expected} bytes, file has {actual}")]
    Truncated {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("'{0}' is a Fallout 1 DAT archive, which is not supported")]
    LegacyFormat(String),

    #[error("archive '{0}' has no entries")]
    EmptyArchive(String),

    #[error("invalid zip archive '{path}': {reason}")]
    InvalidZip { path: String, reason: String },

    #[error("embedded resources are not really embedded (placeholder payload)")]
    EmbeddedPlaceholder,

    #[error("can't read bundle manifest '{path}'")]
    Manifest {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("can't open bundled asset '{path}'")]
    BundleEntry {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure while reading a file that is present in a data source index.
#[derive(Debug, Error)]
pub enum OpenFileError {
    #[error("'{path}' vanished from '{root}' after indexing")]
    Vanished { root: String, path: PathBuf },

    #[error("can't read '{path}' from '{source_name}'")]
    Read {
        source_name: String,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("can't decompress '{path}' from '{source_name}': {reason}")]
    Decompress {
        source_name: String,
        path: String,
        reason: String,
    },

    #[error("'{path}' from '{source_name}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        source_name: String,
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("'{path}' from '{source_name}': CRC-32 mismatch")]
    ChecksumMismatch { source_name: String, path: String },

    #[error("'{path}' uses unsupported compression method {method}")]
    UnsupportedCompression { path: String, method: u16 },

    #[error("corrupt entry '{path}' in '{source_name}': {reason}")]
    CorruptEntry {
        source_name: String,
        path: String,
        reason: String,
    },
}

pub type ConstructionResult<T> = std::result::Result<T, ConstructionError>;
pub type OpenFileResult<T> = std::result::Result<T, OpenFileError>;
