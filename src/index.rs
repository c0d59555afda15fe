//! Case-insensitive path index shared by every backend.
//!
//! Keys are lower-cased paths with forward slashes. Each entry keeps the
//! display-case name plus a backend specific locator. A parallel ordered
//! list of `(key, display name)` pairs drives enumeration.

use std::collections::HashMap;

/// Replace backslashes with forward slashes.
pub fn normalize_path_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Lookup key for a path: slash-normalized and lower-cased.
pub fn lower_key(path: &str) -> String {
    normalize_path_slashes(path).to_lowercase()
}

/// Extension of the last path component without the dot, or `""`.
pub fn file_extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => &name[pos + 1..],
        _ => "",
    }
}

/// Size and modification time of an indexed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    /// Seconds since the Unix epoch, 0 when unknown.
    pub write_time: u64,
}

#[derive(Debug, Clone)]
pub struct IndexEntry<L> {
    /// Path as stored in the backing store (display case).
    pub name: String,
    pub size: u64,
    pub write_time: u64,
    pub locator: L,
}

impl<L> IndexEntry<L> {
    pub fn info(&self) -> FileInfo {
        FileInfo {
            size: self.size,
            write_time: self.write_time,
        }
    }
}

/// Immutable once built: backends fill it during construction only.
#[derive(Debug, Clone)]
pub struct PathIndex<L> {
    entries: HashMap<String, IndexEntry<L>>,
    names: Vec<(String, String)>,
}

impl<L> Default for PathIndex<L> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            names: Vec::new(),
        }
    }
}

impl<L> PathIndex<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. The first entry for a key wins, later duplicates only
    /// show up in the enumeration list.
    pub fn insert(&mut self, name: &str, size: u64, write_time: u64, locator: L) {
        let name = normalize_path_slashes(name);
        let key = name.to_lowercase();

        self.names.push((key.clone(), name.clone()));
        self.entries.entry(key).or_insert(IndexEntry {
            name,
            size,
            write_time,
            locator,
        });
    }

    pub fn get(&self, path_lower: &str) -> Option<&IndexEntry<L>> {
        self.entries.get(path_lower)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list_files(&self, prefix: &str, include_subdirs: bool, ext: &str) -> Vec<String> {
        list_files(&self.names, prefix, include_subdirs, ext)
    }
}

/// Filter `(key, display name)` pairs by directory prefix and extension.
///
/// The prefix match is case-insensitive. Without `include_subdirs` only the
/// direct children of `prefix` are returned. `ext` is compared against the
/// lower-cased key, so it must be given in lower case to match.
pub fn list_files(
    names: &[(String, String)],
    prefix: &str,
    include_subdirs: bool,
    ext: &str,
) -> Vec<String> {
    let mut prefix = lower_key(prefix);
    if !prefix.is_empty() && !prefix.ends_with('/') {
        prefix.push('/');
    }
    let len = prefix.len();

    let mut result: Vec<String> = Vec::new();
    for (key, name) in names {
        if !key.starts_with(&prefix) {
            continue;
        }

        let direct = match key.rfind('/') {
            Some(last) => len > 0 && last < len,
            None => len == 0,
        };
        if !include_subdirs && !direct {
            continue;
        }

        if !ext.is_empty() && file_extension(key) != ext {
            continue;
        }

        if !result.contains(name) {
            result.push(name.clone());
        }
    }

    result
}
