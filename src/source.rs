//! The [`DataSource`] facade: picks a backend for a path and forwards to it.

use std::path::Path;

use log::{debug, warn};

use crate::backend::{
    AssetBundle, Backend, BackendKind, DatArchive, FileData, IndexedDirectory, PlainDirectory,
    ZipArchive, BUNDLE_NAME,
};
use crate::disk;
use crate::error::{ConstructionError, ConstructionResult, OpenFileResult};
use crate::index::{self, FileInfo};
use crate::io::EMBEDDED_NAME;
use crate::options::SourceOptions;

/// How a path should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Directory (indexed recursively), archive, or magic name.
    #[default]
    Default,
    /// Only the top level of a directory, indexed once.
    DirRoot,
    /// A directory read from disk on every call, no index.
    LiveDir,
}

/// Archive extensions tried, in order, when the path itself doesn't exist.
const PACK_EXTENSIONS: [&str; 3] = ["zip", "bos", "dat"];

/// One origin of files: a directory, an archive or a bundle.
pub struct DataSource {
    backend: Box<dyn Backend>,
}

impl DataSource {
    pub fn new(path: &str, mode: SourceMode) -> ConstructionResult<Self> {
        Self::with_options(path, mode, &SourceOptions::default())
    }

    pub fn with_options(
        path: &str,
        mode: SourceMode,
        options: &SourceOptions,
    ) -> ConstructionResult<Self> {
        let backend = select_backend(path, mode, options)?;
        debug!("Data source '{}' served by {:?}", backend.identifier(), backend.kind());
        Ok(Self { backend })
    }

    /// Wrap a custom backend.
    pub fn from_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn is_disk_backed(&self) -> bool {
        self.backend.is_disk_backed()
    }

    pub fn identifier(&self) -> &str {
        self.backend.identifier()
    }

    pub fn file_exists(&self, path: &str, path_lower: &str) -> Option<FileInfo> {
        self.backend.file_exists(path, path_lower)
    }

    pub fn open_file(&self, path: &str, path_lower: &str) -> OpenFileResult<Option<FileData>> {
        self.backend.open_file(path, path_lower)
    }

    pub fn list_files(&self, prefix: &str, include_subdirs: bool, ext: &str) -> Vec<String> {
        self.backend.list_files(prefix, include_subdirs, ext)
    }

    /// [`file_exists`](Self::file_exists) computing the lookup key from `path`.
    pub fn stat(&self, path: &str) -> Option<FileInfo> {
        self.file_exists(path, &index::lower_key(path))
    }

    /// [`open_file`](Self::open_file) computing the lookup key from `path`.
    pub fn read(&self, path: &str) -> OpenFileResult<Option<FileData>> {
        self.open_file(path, &index::lower_key(path))
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("kind", &self.kind())
            .field("identifier", &self.identifier())
            .finish()
    }
}

fn select_backend(
    path: &str,
    mode: SourceMode,
    options: &SourceOptions,
) -> ConstructionResult<Box<dyn Backend>> {
    if path.is_empty() {
        return Err(ConstructionError::InvalidPath(String::new()));
    }

    if path.starts_with('$') {
        if mode != SourceMode::Default {
            return Err(ConstructionError::InvalidMode {
                path: path.to_string(),
                mode,
            });
        }

        return match path {
            EMBEDDED_NAME => Ok(Box::new(ZipArchive::open_embedded(options.get_embedded())?)),
            BUNDLE_NAME => Ok(Box::new(AssetBundle::open(options.get_assets())?)),
            _ => Err(ConstructionError::InvalidPath(path.to_string())),
        };
    }

    match mode {
        SourceMode::DirRoot => {
            if !disk::is_dir(path) {
                warn!("Directory '{}' not found", path);
            }
            return Ok(Box::new(IndexedDirectory::new(path, false)));
        }
        SourceMode::LiveDir => {
            if !disk::is_dir(path) {
                warn!("Directory '{}' not found", path);
            }
            return Ok(Box::new(PlainDirectory::new(path)));
        }
        SourceMode::Default => {}
    }

    if disk::is_dir(path) {
        return Ok(Box::new(IndexedDirectory::new(path, true)));
    }

    if disk::is_file(path) {
        let ext = index::file_extension(path).to_lowercase();
        return open_pack(path, &ext, options).unwrap_or_else(|| {
            Err(ConstructionError::UnknownExtension {
                ext,
                path: path.to_string(),
            })
        });
    }

    for ext in PACK_EXTENSIONS {
        let candidate = format!("{}.{}", path, ext);
        if disk::is_file(Path::new(&candidate)) {
            debug!("Data pack '{}' resolved to '{}'", path, candidate);
            if let Some(backend) = open_pack(&candidate, ext, options) {
                return backend;
            }
        }
    }

    Err(ConstructionError::PackNotFound(path.to_string()))
}

/// Open an archive by extension, `None` when the extension isn't a pack.
fn open_pack(
    path: &str,
    ext: &str,
    options: &SourceOptions,
) -> Option<ConstructionResult<Box<dyn Backend>>> {
    let backend: ConstructionResult<Box<dyn Backend>> = match ext {
        "dat" => DatArchive::open(path, options.get_read_buffer_size())
            .map(|b| Box::new(b) as Box<dyn Backend>),
        "zip" | "bos" => ZipArchive::open(path).map(|b| Box::new(b) as Box<dyn Backend>),
        _ => return None,
    };
    Some(backend)
}
