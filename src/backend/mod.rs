//! Backing stores behind a [`DataSource`](crate::DataSource).
//!
//! Every store implements [`Backend`]. Lookups take both the path as the
//! caller spelled it and its lower-cased key: indexed stores use the key,
//! the live directory store needs the caller's spelling to hit the disk.

mod bundle;
mod dat;
mod dir;
mod zip;

pub use bundle::{AssetBundle, AssetFile, AssetOpener, DirAssets, BUNDLE_NAME, MANIFEST_NAME};
pub use dat::DatArchive;
pub use dir::{IndexedDirectory, PlainDirectory};
pub use zip::ZipArchive;

use crate::error::OpenFileResult;
use crate::index::FileInfo;

/// Which kind of store serves a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    PlainDirectory,
    IndexedDirectory,
    LegacyArchive,
    CompressedArchive,
    PlatformBundle,
}

/// Read-only file store.
///
/// Indices are built in the constructor and never change afterwards, so
/// `file_exists` and `list_files` are safe to call from many threads.
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// True for stores that are plain directories on disk.
    fn is_disk_backed(&self) -> bool;

    /// Archive path, directory root or magic name.
    fn identifier(&self) -> &str;

    fn file_exists(&self, path: &str, path_lower: &str) -> Option<FileInfo>;

    /// Read a whole file. `Ok(None)` when the path isn't in the store.
    fn open_file(&self, path: &str, path_lower: &str) -> OpenFileResult<Option<FileData>>;

    fn list_files(&self, prefix: &str, include_subdirs: bool, ext: &str) -> Vec<String>;
}

/// Contents of a file read from a data source.
///
/// The buffer always holds one extra `0` byte past the file contents so it
/// can be handed to consumers expecting a NUL-terminated string.
#[derive(Clone, PartialEq, Eq)]
pub struct FileData {
    data: Vec<u8>,
    write_time: u64,
}

impl FileData {
    /// Take ownership of `contents` and append the terminating NUL.
    pub fn new(mut contents: Vec<u8>, write_time: u64) -> Self {
        contents.push(0);
        Self {
            data: contents,
            write_time,
        }
    }

    /// File size, not counting the terminator.
    pub fn size(&self) -> u64 {
        (self.data.len() - 1) as u64
    }

    pub fn write_time(&self) -> u64 {
        self.write_time
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.data.len() - 1]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }

    /// File contents without the terminator.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.data.pop();
        self.data
    }
}

impl std::fmt::Debug for FileData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileData")
            .field("size", &self.size())
            .field("write_time", &self.write_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_data_keeps_terminator() {
        let data = FileData::new(b"abc".to_vec(), 7);
        assert_eq!(data.size(), 3);
        assert_eq!(data.as_bytes(), b"abc");
        assert_eq!(data.as_bytes_with_nul(), b"abc\0");
        assert_eq!(data.write_time(), 7);
        assert_eq!(data.into_vec(), b"abc");
    }

    #[test]
    fn empty_file_data() {
        let data = FileData::new(Vec::new(), 0);
        assert_eq!(data.size(), 0);
        assert_eq!(data.as_bytes_with_nul(), b"\0");
    }
}
