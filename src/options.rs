use std::fmt;
use std::sync::Arc;

use crate::backend::{AssetOpener, DirAssets};
use crate::embedded::EMBEDDED_RESOURCES;

/// Default size of the staging buffer used when inflating DAT entries.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 0x40000;

/// Settings used when building a [`DataSource`](crate::DataSource).
///
/// ```
/// use respack::{DirAssets, SourceOptions};
///
/// let options = SourceOptions::new()
///     .assets(DirAssets::new("assets"))
///     .read_buffer_size(64 * 1024);
/// assert_eq!(options.get_read_buffer_size(), 64 * 1024);
/// ```
#[derive(Clone)]
pub struct SourceOptions {
    embedded: &'static [u8],
    assets: Arc<dyn AssetOpener>,
    read_buffer_size: usize,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            embedded: EMBEDDED_RESOURCES,
            assets: Arc::new(DirAssets::default()),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// ZIP image served as `$Embedded` instead of the compiled-in one.
    pub fn embedded(mut self, payload: &'static [u8]) -> Self {
        self.embedded = payload;
        self
    }

    /// Opener used by the `$AndroidAssets` bundle.
    pub fn assets(mut self, opener: impl AssetOpener + 'static) -> Self {
        self.assets = Arc::new(opener);
        self
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    pub fn get_embedded(&self) -> &'static [u8] {
        self.embedded
    }

    pub fn get_assets(&self) -> Arc<dyn AssetOpener> {
        Arc::clone(&self.assets)
    }

    pub fn get_read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }
}

impl fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceOptions")
            .field("embedded_len", &self.embedded.len())
            .field("read_buffer_size", &self.read_buffer_size)
            .finish_non_exhaustive()
    }
}
