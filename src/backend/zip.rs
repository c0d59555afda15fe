use log::{debug, trace};
use parking_lot::Mutex;
use std::path::Path;

use super::{Backend, BackendKind, FileData};
use crate::error::{ConstructionError, ConstructionResult, OpenFileError, OpenFileResult};
use crate::index::{FileInfo, PathIndex};
use crate::io::{LocalFileStream, MemoryStream, StreamIo, EMBEDDED_NAME};
use crate::zip::{ZipError, ZipExtractor, ZipFileEntry};

/// `.zip` / `.bos` pack, on disk or compiled into the binary.
pub struct ZipArchive {
    name: String,
    index: PathIndex<ZipFileEntry>,
    extractor: Mutex<ZipExtractor<Box<dyn StreamIo>>>,
}

impl ZipArchive {
    /// Open an archive on disk.
    pub fn open(path: &str) -> ConstructionResult<Self> {
        let stream = LocalFileStream::open(Path::new(path)).map_err(|source| {
            ConstructionError::ArchiveOpen {
                path: path.to_string(),
                source,
            }
        })?;
        let write_time = stream.write_time();
        Self::from_stream(path, Box::new(stream), write_time)
    }

    /// Open the archive image compiled into the binary.
    pub fn open_embedded(payload: &'static [u8]) -> ConstructionResult<Self> {
        let stream = MemoryStream::open_embedded(EMBEDDED_NAME, payload)?;
        Self::from_stream(EMBEDDED_NAME, Box::new(stream), 0)
    }

    pub fn from_stream(
        name: &str,
        stream: Box<dyn StreamIo>,
        write_time: u64,
    ) -> ConstructionResult<Self> {
        let invalid = |e: ZipError| ConstructionError::InvalidZip {
            path: name.to_string(),
            reason: e.to_string(),
        };

        let mut extractor = ZipExtractor::new(stream).map_err(invalid)?;
        let entries = extractor.list_files().map_err(invalid)?;
        if entries.is_empty() {
            return Err(ConstructionError::EmptyArchive(name.to_string()));
        }

        let mut index = PathIndex::new();
        for entry in entries {
            if entry.is_directory() {
                continue;
            }
            index.insert(&entry.file_name, entry.uncompressed_size, write_time, entry.clone());
        }

        debug!(
            "Opened zip archive '{}' ({} files, {} bytes)",
            name,
            index.len(),
            extractor.archive_size()
        );

        Ok(Self {
            name: name.to_string(),
            index,
            extractor: Mutex::new(extractor),
        })
    }
}

impl Backend for ZipArchive {
    fn kind(&self) -> BackendKind {
        BackendKind::CompressedArchive
    }

    fn is_disk_backed(&self) -> bool {
        false
    }

    fn identifier(&self) -> &str {
        &self.name
    }

    fn file_exists(&self, _path: &str, path_lower: &str) -> Option<FileInfo> {
        self.index.get(path_lower).map(|entry| entry.info())
    }

    fn open_file(&self, path: &str, path_lower: &str) -> OpenFileResult<Option<FileData>> {
        let Some(entry) = self.index.get(path_lower) else {
            return Ok(None);
        };

        let data = self
            .extractor
            .lock()
            .extract_to_memory(&entry.locator)
            .map_err(|e| self.open_error(path, e))?;

        trace!("Read '{}' ({} bytes) from '{}'", entry.name, data.len(), self.name);
        Ok(Some(FileData::new(data, entry.write_time)))
    }

    fn list_files(&self, prefix: &str, include_subdirs: bool, ext: &str) -> Vec<String> {
        self.index.list_files(prefix, include_subdirs, ext)
    }
}

impl ZipArchive {
    fn open_error(&self, path: &str, err: ZipError) -> OpenFileError {
        let source_name = self.name.clone();
        let path = path.to_string();
        match err {
            ZipError::Io(source) => OpenFileError::Read {
                source_name,
                path,
                source,
            },
            ZipError::UnsupportedCompression(method) => {
                OpenFileError::UnsupportedCompression { path, method }
            }
            ZipError::SizeMismatch { expected, actual } => OpenFileError::SizeMismatch {
                source_name,
                path,
                expected,
                actual,
            },
            ZipError::ChecksumMismatch => OpenFileError::ChecksumMismatch { source_name, path },
            ZipError::Inflate(reason) => OpenFileError::Decompress {
                source_name,
                path,
                reason,
            },
            ZipError::Format(reason) => OpenFileError::CorruptEntry {
                source_name,
                path,
                reason: reason.to_string(),
            },
        }
    }
}

impl Drop for ZipArchive {
    fn drop(&mut self) {
        // Already-closed streams only report that they are closed
        let _ = self.extractor.get_mut().close();
    }
}
