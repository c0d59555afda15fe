//! Thin layer over the host file system.
//!
//! Everything the backends need from the disk goes through here: opening a
//! file for reading, positioned reads, size and write time queries, and
//! directory enumeration.

use std::fs::{File, Metadata};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use walkdir::WalkDir;

/// A file opened for reading.
#[derive(Debug)]
pub struct DiskFile {
    file: File,
    size: u64,
    write_time: u64,
}

impl DiskFile {
    /// Open a regular file. Directories are rejected with `NotFound`.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' is not a regular file", path.as_ref().display()),
            ));
        }

        Ok(Self {
            file,
            size: meta.len(),
            write_time: write_time_of(&meta),
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last modification time, seconds since the Unix epoch.
    pub fn write_time(&self) -> u64 {
        self.write_time
    }

    pub fn pos(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    pub fn set_pos(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    /// Fill `buf` completely or fail.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact(buf)
    }

    /// Read up to `buf.len()` bytes, returning how many were read.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    /// Read the rest of the file from the current position.
    pub fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        self.file.read_to_end(buf)
    }
}

/// Whether `path` names an existing directory.
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

/// Whether `path` names an existing regular file.
pub fn is_file(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

/// Make `path` absolute. Existing paths are canonicalized, missing ones are
/// joined onto the current directory.
pub fn resolve_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Visit every regular file under `dir`.
///
/// The visitor receives the path relative to `dir` with `/` separators, the
/// file size and its write time. `ext` restricts the walk to files with that
/// extension (compared case-insensitively) when non-empty. Unreadable entries
/// are skipped. A missing `dir` visits nothing.
pub fn iterate_dir<F>(dir: impl AsRef<Path>, ext: &str, recursive: bool, mut visitor: F)
where
    F: FnMut(&str, u64, u64),
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return;
    }

    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");

        if !ext.is_empty() && !crate::index::file_extension(&rel).eq_ignore_ascii_case(ext) {
            continue;
        }

        let Ok(meta) = entry.metadata() else {
            continue;
        };

        visitor(&rel, meta.len(), write_time_of(&meta));
    }
}

fn write_time_of(meta: &Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
