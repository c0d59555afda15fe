//! # respack
//!
//! Read-only virtual file access over heterogeneous resource stores.
//!
//! A [`DataSource`] hides where files come from. The same calls read from a
//! directory, a Fallout 2 / Arcanum `.dat` archive, a `.zip` / `.bos` pack,
//! a ZIP image compiled into the binary (`$Embedded`) or a platform asset
//! bundle (`$AndroidAssets`).
//!
//! ## Features
//!
//! - Case-insensitive path lookups against an index built once per source
//! - Both `.dat` tree layouts, with zlib-packed entries
//! - ZIP64, STORED and DEFLATE entries, with size and CRC-32 checks
//! - One ZIP parser for disk files and in-memory images
//! - Prefix, depth and extension filtered listings
//!
//! ## Example
//!
//! ```no_run
//! use respack::{DataSource, SourceMode};
//!
//! fn main() -> anyhow::Result<()> {
//!     // Resolves "master" to master.zip, master.bos or master.dat
//!     let source = DataSource::new("data/master", SourceMode::Default)?;
//!
//!     for name in source.list_files("proto/items", false, "pro") {
//!         if let Some(file) = source.read(&name)? {
//!             println!("{}: {} bytes", name, file.size());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod disk;
pub mod embedded;
pub mod error;
pub mod index;
pub mod io;
pub mod options;
pub mod source;
pub mod zip;

pub use backend::{AssetOpener, Backend, BackendKind, DirAssets, FileData};
pub use cli::Cli;
pub use error::{ConstructionError, OpenFileError};
pub use index::FileInfo;
pub use options::SourceOptions;
pub use source::{DataSource, SourceMode};
