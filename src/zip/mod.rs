//! ZIP archive parsing and extraction.
//!
//! Backs the compressed-archive data source (`.zip` and `.bos` packs, and
//! the `$Embedded` image). Works over any [`StreamIo`](crate::io::StreamIo),
//! so disk files and in-memory buffers share one parser.
//!
//! - [`structures`]: fixed records (End of Central Directory, ZIP64 records)
//!   and the parsed entry type
//! - [`parser`]: locates the Central Directory and walks its headers
//! - [`extractor`]: whole-entry extraction with size and CRC-32 checks
//!
//! Entries may be STORED or DEFLATE; ZIP64 sizes and offsets are honoured.
//! Encryption, multi-disk archives and other compression methods are not
//! supported.

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::{CentralDirectory, ZipParser};
pub use structures::*;

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZipError {
    #[error("{0}")]
    Format(&'static str),

    #[error("unsupported compression method {0}")]
    UnsupportedCompression(u16),

    #[error("inflate failed: {0}")]
    Inflate(String),

    #[error("expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("CRC-32 mismatch")]
    ChecksumMismatch,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ZipResult<T> = std::result::Result<T, ZipError>;
