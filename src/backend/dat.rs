//! Fallout 2 and Arcanum `.dat` archives.
//!
//! Both formats keep their directory tree at the end of the file. The tree is
//! loaded into one buffer and the index stores offsets into it, pointing at a
//! 13-byte locator:
//!
//! | offset | size | field                     |
//! |--------|------|---------------------------|
//! | 0      | 1    | packed flag (0 = plain)   |
//! | 1      | 4    | real size                 |
//! | 5      | 4    | packed size               |
//! | 9      | 4    | data offset in the file   |
//!
//! All integers are little-endian.

use byteorder::{ByteOrder, LittleEndian};
use flate2::{Decompress, FlushDecompress, Status};
use parking_lot::Mutex;
use std::io::SeekFrom;

use log::{debug, trace};

use super::{Backend, BackendKind, FileData};
use crate::disk::DiskFile;
use crate::error::{ConstructionError, ConstructionResult, OpenFileError, OpenFileResult};
use crate::index::{FileInfo, PathIndex};

/// "1TAD" read as a little-endian u32, 12 bytes before the end.
const ARCANUM_SIGNATURE: u32 = 0x44415431;
/// Arcanum trailer: GUID, signature, names size, tree size.
const ARCANUM_INFO_SIZE: u32 = 28;
/// Bytes after the name in an Arcanum entry.
const ARCANUM_RECORD_SIZE: usize = 20;
/// The locator starts at the high byte of the type field.
const ARCANUM_LOCATOR_OFFSET: usize = 7;
const ARCANUM_FOLDER: u32 = 0x400;
const ARCANUM_PACKED: u32 = 2;

const LOCATOR_SIZE: usize = 13;

/// High bytes of the first word of a Fallout 1 archive.
const FALLOUT1_MARKERS: [u32; 2] = [0x01, 0x33];

#[derive(Debug, Clone, Copy)]
struct Locator {
    packed: bool,
    real_size: u32,
    packed_size: u32,
    offset: u32,
}

impl Locator {
    fn read(tree: &[u8], at: usize) -> Option<Self> {
        let bytes = tree.get(at..at.checked_add(LOCATOR_SIZE)?)?;
        Some(Self {
            packed: bytes[0] != 0,
            real_size: LittleEndian::read_u32(&bytes[1..5]),
            packed_size: LittleEndian::read_u32(&bytes[5..9]),
            offset: LittleEndian::read_u32(&bytes[9..13]),
        })
    }
}

/// Archive handle plus the inflate staging buffer, used by one read at a time.
struct ReadState {
    file: DiskFile,
    read_buf: Vec<u8>,
}

pub struct DatArchive {
    name: String,
    tree: Vec<u8>,
    index: PathIndex<usize>,
    write_time: u64,
    state: Mutex<ReadState>,
}

impl DatArchive {
    pub fn open(path: &str, read_buffer_size: usize) -> ConstructionResult<Self> {
        let mut file = DiskFile::open(path).map_err(|source| ConstructionError::ArchiveOpen {
            path: path.to_string(),
            source,
        })?;
        let write_time = file.write_time();

        let (tree, entries) = TreeReader { file: &mut file, path }.read()?;

        let mut index = PathIndex::new();
        for (name, at) in entries {
            // The tree reader only yields locators that fit in the tree
            let Some(loc) = Locator::read(&tree, at) else {
                continue;
            };
            index.insert(&name, loc.real_size as u64, write_time, at);
        }

        debug!("Opened DAT archive '{}' ({} files)", path, index.len());

        Ok(Self {
            name: path.to_string(),
            tree,
            index,
            write_time,
            state: Mutex::new(ReadState {
                file,
                read_buf: vec![0u8; read_buffer_size.max(1)],
            }),
        })
    }

    fn read_plain(&self, file: &mut DiskFile, path: &str, size: usize) -> OpenFileResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(size + 1);
        buf.resize(size, 0);
        file.read_exact(&mut buf).map_err(|source| self.read_error(path, source))?;
        Ok(buf)
    }

    /// Inflate a zlib stream of `packed_size` bytes into exactly `size` bytes.
    fn read_packed(
        &self,
        state: &mut ReadState,
        path: &str,
        size: usize,
        packed_size: usize,
    ) -> OpenFileResult<Vec<u8>> {
        let ReadState { file, read_buf } = state;

        let mut out = Vec::with_capacity(size + 1);
        out.resize(size, 0);

        let mut stream = Decompress::new(true);
        let mut left = packed_size;
        let (mut in_pos, mut in_len) = (0usize, 0usize);
        let mut produced = 0usize;

        while produced < size {
            if in_pos == in_len && left > 0 {
                let len = left.min(read_buf.len());
                file.read_exact(&mut read_buf[..len])
                    .map_err(|source| self.read_error(path, source))?;
                in_pos = 0;
                in_len = len;
                left -= len;
            }

            let before_in = stream.total_in();
            let before_out = stream.total_out();
            let status = stream
                .decompress(&read_buf[in_pos..in_len], &mut out[produced..], FlushDecompress::None)
                .map_err(|e| self.decompress_error(path, e.to_string()))?;
            in_pos += (stream.total_in() - before_in) as usize;
            produced += (stream.total_out() - before_out) as usize;

            match status {
                Status::StreamEnd => break,
                Status::BufError => {
                    return Err(self.decompress_error(path, "stream stalled".to_string()));
                }
                Status::Ok => {}
            }
        }

        if produced != size {
            return Err(OpenFileError::SizeMismatch {
                source_name: self.name.clone(),
                path: path.to_string(),
                expected: size as u64,
                actual: produced as u64,
            });
        }

        Ok(out)
    }

    fn read_error(&self, path: &str, source: std::io::Error) -> OpenFileError {
        OpenFileError::Read {
            source_name: self.name.clone(),
            path: path.to_string(),
            source,
        }
    }

    fn decompress_error(&self, path: &str, reason: String) -> OpenFileError {
        OpenFileError::Decompress {
            source_name: self.name.clone(),
            path: path.to_string(),
            reason,
        }
    }
}

impl Backend for DatArchive {
    fn kind(&self) -> BackendKind {
        BackendKind::LegacyArchive
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

        let loc = Locator::read(&self.tree, entry.locator).ok_or_else(|| {
            OpenFileError::CorruptEntry {
                source_name: self.name.clone(),
                path: path.to_string(),
                reason: "locator outside of tree".to_string(),
            }
        })?;

        let mut state = self.state.lock();
        state
            .file
            .set_pos(SeekFrom::Start(loc.offset as u64))
            .map_err(|source| self.read_error(path, source))?;

        let size = loc.real_size as usize;
        let data = if loc.packed {
            self.read_packed(&mut state, path, size, loc.packed_size as usize)?
        } else {
            self.read_plain(&mut state.file, path, size)?
        };

        trace!("Read '{}' ({} bytes, packed: {}) from '{}'", entry.name, size, loc.packed, self.name);
        Ok(Some(FileData::new(data, self.write_time)))
    }

    fn list_files(&self, prefix: &str, include_subdirs: bool, ext: &str) -> Vec<String> {
        self.index.list_files(prefix, include_subdirs, ext)
    }
}

/// Loads the directory tree and walks its entries.
struct TreeReader<'a> {
    file: &'a mut DiskFile,
    path: &'a str,
}

type TreeEntries = Vec<(String, usize)>;

impl TreeReader<'_> {
    fn read(mut self) -> ConstructionResult<(Vec<u8>, TreeEntries)> {
        if self.file.size() < 12 {
            return Err(self.corrupt("file too small"));
        }

        if self.u32_at(SeekFrom::End(-12))? == ARCANUM_SIGNATURE {
            self.read_arcanum()
        } else {
            self.read_fallout2()
        }
    }

    fn read_arcanum(&mut self) -> ConstructionResult<(Vec<u8>, TreeEntries)> {
        let tree_size = self.u32_at(SeekFrom::End(-4))?;
        if tree_size < ARCANUM_INFO_SIZE + 4 || tree_size as u64 > self.file.size() {
            return Err(self.corrupt(&format!("bad tree size {}", tree_size)));
        }

        let _files_total = self.u32_at(SeekFrom::End(-(tree_size as i64)))?;
        let mut tree = vec![0u8; (tree_size - ARCANUM_INFO_SIZE - 4) as usize];
        self.file.read_exact(&mut tree)?;

        let mut entries = Vec::new();
        let mut ptr = 0usize;
        while ptr < tree.len() {
            let record = self.entry_header(&tree, ptr, ARCANUM_RECORD_SIZE)?;
            let kind = LittleEndian::read_u32(&tree[record + 4..record + 8]);

            let name = entry_name(&tree[ptr + 4..record]);
            if !name.is_empty() && kind != ARCANUM_FOLDER {
                if kind == ARCANUM_PACKED {
                    tree[record + ARCANUM_LOCATOR_OFFSET] = 1;
                }
                entries.push((name, record + ARCANUM_LOCATOR_OFFSET));
            }

            ptr = record + ARCANUM_RECORD_SIZE;
        }

        Ok((tree, entries))
    }

    fn read_fallout2(&mut self) -> ConstructionResult<(Vec<u8>, TreeEntries)> {
        let tree_size = self.u32_at(SeekFrom::End(-8))?;
        let dat_size = self.u32_at(SeekFrom::End(-4))?;

        // Fallout 1 archives start with a big-endian directory count
        let marker = self.u32_at(SeekFrom::Start(0))? >> 24;
        if FALLOUT1_MARKERS.contains(&marker) {
            return Err(ConstructionError::LegacyFormat(self.path.to_string()));
        }

        if self.file.size() != dat_size as u64 {
            return Err(ConstructionError::Truncated {
                path: self.path.to_string(),
                expected: dat_size as u64,
                actual: self.file.size(),
            });
        }

        if tree_size < 4 || tree_size as u64 + 8 > self.file.size() {
            return Err(self.corrupt(&format!("bad tree size {}", tree_size)));
        }

        let _files_total = self.u32_at(SeekFrom::End(-(tree_size as i64 + 8)))?;
        let mut tree = vec![0u8; (tree_size - 4) as usize];
        self.file.read_exact(&mut tree)?;

        let mut entries = Vec::new();
        let mut ptr = 0usize;
        while ptr < tree.len() {
            let record = self.entry_header(&tree, ptr, LOCATOR_SIZE)?;

            let name = entry_name(&tree[ptr + 4..record]);
            if !name.is_empty() {
                entries.push((name, record));
            }

            ptr = record + LOCATOR_SIZE;
        }

        Ok((tree, entries))
    }

    /// Record start of the entry at `ptr`, checking that the
    /// name and `record_size` bytes after it lie inside the tree.
    fn entry_header(
        &self,
        tree: &[u8],
        ptr: usize,
        record_size: usize,
    ) -> ConstructionResult<usize> {
        let header = tree
            .get(ptr..ptr + 4)
            .ok_or_else(|| self.corrupt(&format!("truncated entry at {}", ptr)))?;
        let name_len = LittleEndian::read_u32(header) as usize;

        let record = (ptr + 4)
            .checked_add(name_len)
            .filter(|record| record + record_size <= tree.len())
            .ok_or_else(|| self.corrupt(&format!("entry at {} runs past the tree", ptr)))?;

        Ok(record)
    }

    fn u32_at(&mut self, pos: SeekFrom) -> ConstructionResult<u32> {
        let mut buf = [0u8; 4];
        self.file.set_pos(pos)?;
        self.file.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    fn corrupt(&self, reason: &str) -> ConstructionError {
        ConstructionError::CorruptTree {
            path: self.path.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn entry_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    name.trim_end_matches('\0').replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_fields() {
        let mut tree = vec![0xAA; 2];
        tree.push(1);
        tree.extend_from_slice(&10u32.to_le_bytes());
        tree.extend_from_slice(&4u32.to_le_bytes());
        tree.extend_from_slice(&99u32.to_le_bytes());

        let loc = Locator::read(&tree, 2).unwrap();
        assert!(loc.packed);
        assert_eq!(loc.real_size, 10);
        assert_eq!(loc.packed_size, 4);
        assert_eq!(loc.offset, 99);
        assert!(Locator::read(&tree, 3).is_none());
    }

    #[test]
    fn entry_names_are_normalized() {
        assert_eq!(entry_name(b"ART\\CRITTERS\\HMJMPSAA.FRM\0"), "ART/CRITTERS/HMJMPSAA.FRM");
        assert_eq!(entry_name(b"\0\0"), "");
    }
}
