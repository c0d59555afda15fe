use std::path::{Component, Path, PathBuf};

use log::{debug, trace};

use super::{Backend, BackendKind, FileData};
use crate::disk::{self, DiskFile};
use crate::error::{OpenFileError, OpenFileResult};
use crate::index::{self, FileInfo, PathIndex};

fn root_string(root: &Path) -> String {
    let mut s = root.to_string_lossy().replace('\\', "/");
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

/// Directory read straight from disk on every call.
pub struct PlainDirectory {
    root: PathBuf,
    name: String,
}

impl PlainDirectory {
    pub fn new(path: &str) -> Self {
        let root = disk::resolve_path(path);
        let name = root_string(&root);
        debug!("Live directory '{}'", name);
        Self { root, name }
    }
}

impl PlainDirectory {
    /// `path` under the root, `None` when it is absolute or climbs out.
    fn full_path(&self, path: &str) -> Option<PathBuf> {
        let rel = index::normalize_path_slashes(path);
        let confined = Path::new(&rel)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        confined.then(|| self.root.join(rel))
    }
}

impl Backend for PlainDirectory {
    fn kind(&self) -> BackendKind {
        BackendKind::PlainDirectory
    }

    fn is_disk_backed(&self) -> bool {
        true
    }

    fn identifier(&self) -> &str {
        &self.name
    }

    fn file_exists(&self, path: &str, _path_lower: &str) -> Option<FileInfo> {
        let file = DiskFile::open(self.full_path(path)?).ok()?;
        Some(FileInfo {
            size: file.size(),
            write_time: file.write_time(),
        })
    }

    fn open_file(&self, path: &str, _path_lower: &str) -> OpenFileResult<Option<FileData>> {
        let Some(full) = self.full_path(path) else {
            return Ok(None);
        };
        let Ok(mut file) = DiskFile::open(full) else {
            return Ok(None);
        };

        let mut buf = Vec::with_capacity(file.size() as usize + 1);
        file.read_to_end(&mut buf).map_err(|source| OpenFileError::Read {
            source_name: self.name.clone(),
            path: path.to_string(),
            source,
        })?;

        trace!("Read '{}' from '{}'", path, self.name);
        Ok(Some(FileData::new(buf, file.write_time())))
    }

    fn list_files(&self, prefix: &str, include_subdirs: bool, ext: &str) -> Vec<String> {
        let prefix_dir = index::normalize_path_slashes(prefix);
        let prefix_dir = prefix_dir.trim_end_matches('/');
        let Some(dir) = self.full_path(prefix_dir) else {
            return Vec::new();
        };

        let mut names = Vec::new();
        disk::iterate_dir(dir, "", include_subdirs, |rel, _, _| {
            let name = if prefix_dir.is_empty() {
                rel.to_string()
            } else {
                format!("{}/{}", prefix_dir, rel)
            };
            names.push((name.to_lowercase(), name));
        });

        index::list_files(&names, prefix, include_subdirs, ext)
    }
}

/// Directory whose file list is captured once at construction.
///
/// Contents are still read from disk, only the set of files, their sizes
/// and write times are frozen.
pub struct IndexedDirectory {
    name: String,
    index: PathIndex<PathBuf>,
}

impl IndexedDirectory {
    pub fn new(path: &str, recursive: bool) -> Self {
        let root = disk::resolve_path(path);
        let name = root_string(&root);

        let mut index = PathIndex::new();
        disk::iterate_dir(&root, "", recursive, |rel, size, write_time| {
            index.insert(rel, size, write_time, root.join(rel));
        });

        debug!(
            "Indexed directory '{}' ({} files, recursive: {})",
            name,
            index.len(),
            recursive
        );

        Self { name, index }
    }
}

impl Backend for IndexedDirectory {
    fn kind(&self) -> BackendKind {
        BackendKind::IndexedDirectory
    }

    fn is_disk_backed(&self) -> bool {
        true
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

        let mut file = DiskFile::open(&entry.locator).map_err(|_| OpenFileError::Vanished {
            root: self.name.clone(),
            path: entry.locator.clone(),
        })?;

        let mut buf = Vec::with_capacity(entry.size as usize + 1);
        file.read_to_end(&mut buf).map_err(|source| OpenFileError::Read {
            source_name: self.name.clone(),
            path: path.to_string(),
            source,
        })?;

        trace!("Read '{}' from '{}'", entry.name, self.name);
        Ok(Some(FileData::new(buf, entry.write_time)))
    }

    fn list_files(&self, prefix: &str, include_subdirs: bool, ext: &str) -> Vec<String> {
        self.index.list_files(prefix, include_subdirs, ext)
    }
}
