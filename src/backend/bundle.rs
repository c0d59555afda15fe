use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, trace};

use super::{Backend, BackendKind, FileData};
use crate::disk::DiskFile;
use crate::error::{ConstructionError, ConstructionResult, OpenFileError, OpenFileResult};
use crate::index::{FileInfo, PathIndex};

/// Manifest listing every bundled asset, one path per line.
pub const MANIFEST_NAME: &str = "FilesTree.txt";

/// Magic name of the platform bundle.
pub const BUNDLE_NAME: &str = "$AndroidAssets";

/// A bundled asset read in full.
#[derive(Debug, Clone)]
pub struct AssetFile {
    pub data: Vec<u8>,
    pub write_time: u64,
}

/// Platform primitive for opening bundled assets by relative path.
pub trait AssetOpener: Send + Sync {
    fn open(&self, path: &str) -> io::Result<AssetFile>;
}

/// Assets stored as plain files under a root directory.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for DirAssets {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AssetOpener for DirAssets {
    fn open(&self, path: &str) -> io::Result<AssetFile> {
        let mut file = DiskFile::open(self.root.join(path))?;
        let mut data = Vec::with_capacity(file.size() as usize + 1);
        file.read_to_end(&mut data)?;
        Ok(AssetFile {
            data,
            write_time: file.write_time(),
        })
    }
}

/// Assets packaged with the application, enumerated by [`MANIFEST_NAME`].
pub struct AssetBundle {
    assets: Arc<dyn AssetOpener>,
    index: PathIndex<String>,
}

impl AssetBundle {
    /// Read the manifest and open every listed asset once to record its
    /// size and write time.
    pub fn open(assets: Arc<dyn AssetOpener>) -> ConstructionResult<Self> {
        let manifest = assets
            .open(MANIFEST_NAME)
            .map_err(|source| ConstructionError::Manifest {
                path: MANIFEST_NAME.to_string(),
                source,
            })?;

        let text = String::from_utf8_lossy(&manifest.data).replace("\r\n", "\n").replace('\r', "\n");

        let mut index = PathIndex::new();
        for name in text.split('\n').filter(|line| !line.is_empty()) {
            let file = assets
                .open(name)
                .map_err(|source| ConstructionError::BundleEntry {
                    path: name.to_string(),
                    source,
                })?;
            index.insert(name, file.data.len() as u64, file.write_time, name.to_string());
        }

        debug!("Opened asset bundle ({} files)", index.len());

        Ok(Self { assets, index })
    }
}

impl Backend for AssetBundle {
    fn kind(&self) -> BackendKind {
        BackendKind::PlatformBundle
    }

    fn is_disk_backed(&self) -> bool {
        false
    }

    fn identifier(&self) -> &str {
        BUNDLE_NAME
    }

    fn file_exists(&self, _path: &str, path_lower: &str) -> Option<FileInfo> {
        self.index.get(path_lower).map(|entry| entry.info())
    }

    fn open_file(&self, path: &str, path_lower: &str) -> OpenFileResult<Option<FileData>> {
        let Some(entry) = self.index.get(path_lower) else {
            return Ok(None);
        };

        let file = self
            .assets
            .open(&entry.locator)
            .map_err(|source| OpenFileError::Read {
                source_name: BUNDLE_NAME.to_string(),
                path: path.to_string(),
                source,
            })?;

        trace!("Read '{}' from the asset bundle", entry.name);
        Ok(Some(FileData::new(file.data, entry.write_time)))
    }

    fn list_files(&self, prefix: &str, include_subdirs: bool, ext: &str) -> Vec<String> {
        self.index.list_files(prefix, include_subdirs, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapAssets(HashMap<&'static str, &'static str>);

    impl AssetOpener for MapAssets {
        fn open(&self, path: &str) -> io::Result<AssetFile> {
            self.0
                .get(path)
                .map(|data| AssetFile {
                    data: data.as_bytes().to_vec(),
                    write_time: 42,
                })
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn assets(entries: &[(&'static str, &'static str)]) -> Arc<dyn AssetOpener> {
        Arc::new(MapAssets(entries.iter().copied().collect()))
    }

    #[test]
    fn manifest_is_indexed() {
        let bundle = AssetBundle::open(assets(&[
            (MANIFEST_NAME, "Maps/Town.fomap\r\nreadme.txt\r\n"),
            ("Maps/Town.fomap", "map"),
            ("readme.txt", "hello"),
        ]))
        .unwrap();

        assert_eq!(
            bundle.file_exists("maps/town.fomap", "maps/town.fomap"),
            Some(FileInfo { size: 3, write_time: 42 })
        );
        assert_eq!(bundle.list_files("", false, ""), vec!["readme.txt"]);

        let data = bundle.open_file("README.TXT", "readme.txt").unwrap().unwrap();
        assert_eq!(data.as_bytes(), b"hello");
        assert!(bundle.open_file("nope", "nope").unwrap().is_none());
        assert_eq!(bundle.identifier(), "$AndroidAssets");
    }

    #[test]
    fn missing_manifest_fails() {
        assert!(matches!(
            AssetBundle::open(assets(&[])),
            Err(ConstructionError::Manifest { .. })
        ));
    }

    #[test]
    fn missing_listed_asset_fails() {
        assert!(matches!(
            AssetBundle::open(assets(&[(MANIFEST_NAME, "gone.txt")])),
            Err(ConstructionError::BundleEntry { .. })
        ));
    }
}
