//! Archive writers for the integration tests.

#![allow(dead_code)]

use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::{Compression, Crc};
use std::io::Write;
use std::path::Path;

pub struct Entry {
    pub name: &'static str,
    pub data: Vec<u8>,
    pub packed: bool,
}

impl Entry {
    pub fn plain(name: &'static str, data: &[u8]) -> Self {
        Self {
            name,
            data: data.to_vec(),
            packed: false,
        }
    }

    pub fn packed(name: &'static str, data: &[u8]) -> Self {
        Self {
            name,
            data: data.to_vec(),
            packed: true,
        }
    }
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Fallout 2 layout: data, file count, entries, tree size, archive size.
pub fn fallout2_dat(entries: &[Entry]) -> Vec<u8> {
    // Leading zero word keeps the Fallout 1 check quiet
    let mut out = vec![0u8; 4];
    let mut tree = Vec::new();

    for entry in entries {
        let stored = if entry.packed { zlib(&entry.data) } else { entry.data.clone() };
        let offset = out.len() as u32;
        out.extend_from_slice(&stored);

        let name = entry.name.replace('/', "\\");
        put_u32(&mut tree, name.len() as u32);
        tree.extend_from_slice(name.as_bytes());
        tree.push(entry.packed as u8);
        put_u32(&mut tree, entry.data.len() as u32);
        put_u32(&mut tree, stored.len() as u32);
        put_u32(&mut tree, offset);
    }

    put_u32(&mut out, entries.len() as u32);
    out.extend_from_slice(&tree);
    put_u32(&mut out, (tree.len() + 4) as u32);
    let total = out.len() as u32 + 4;
    put_u32(&mut out, total);
    out
}

/// Arcanum layout: data, file count, entries, 28-byte trailer.
///
/// Names are written NUL-terminated, folders get type 0x400.
pub fn arcanum_dat(entries: &[Entry], folders: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut tree = Vec::new();

    let record = |tree: &mut Vec<u8>, name: &str, kind: u32, real: u32, packed: u32, offset: u32| {
        let mut raw = name.replace('/', "\\").into_bytes();
        raw.push(0);
        put_u32(tree, raw.len() as u32);
        tree.extend_from_slice(&raw);
        put_u32(tree, 0);
        put_u32(tree, kind);
        put_u32(tree, real);
        put_u32(tree, packed);
        put_u32(tree, offset);
    };

    for folder in folders {
        record(&mut tree, folder, 0x400, 0, 0, 0);
    }

    for entry in entries {
        let stored = if entry.packed { zlib(&entry.data) } else { entry.data.clone() };
        let offset = out.len() as u32;
        out.extend_from_slice(&stored);

        let kind = if entry.packed { 2 } else { 1 };
        record(&mut tree, entry.name, kind, entry.data.len() as u32, stored.len() as u32, offset);
    }

    put_u32(&mut out, (entries.len() + folders.len()) as u32);
    out.extend_from_slice(&tree);

    // GUID, signature, names size, tree size
    out.extend_from_slice(&[0x5A; 16]);
    put_u32(&mut out, 0x44415431);
    put_u32(&mut out, 0);
    put_u32(&mut out, (tree.len() + 4 + 28) as u32);
    out
}

/// Optional ZIP trailer and header variations.
#[derive(Default)]
pub struct ZipLayout {
    /// Archive comment after the End of Central Directory.
    pub comment: &'static [u8],
    /// Write a ZIP64 end record and locator, saturating the classic fields.
    pub zip64_end: bool,
    /// Saturate the Central Directory sizes and carry them in a ZIP64 extra field.
    pub zip64_sizes: bool,
    /// Uncompressed size written into the ZIP64 extra field instead of the real one.
    pub size_override: Option<u64>,
}

/// ZIP archive with STORED or DEFLATE entries, plus optional folder entries.
pub fn zip(entries: &[Entry], folders: &[&str]) -> Vec<u8> {
    zip_with(entries, folders, &ZipLayout::default())
}

pub fn zip_with(entries: &[Entry], folders: &[&str], layout: &ZipLayout) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();
    let mut count = 0u16;

    let mut add = |out: &mut Vec<u8>, name: &str, data: &[u8], packed: bool, external: u32| {
        let stored = if packed { deflate(data) } else { data.to_vec() };
        let method = if packed { 8 } else { 0 };
        let crc = crc32(data);
        let offset = out.len() as u32;

        out.extend_from_slice(b"PK\x03\x04");
        put_u16(out, 20);
        put_u16(out, 0);
        put_u16(out, method);
        put_u16(out, 0);
        put_u16(out, 0x21);
        put_u32(out, crc);
        put_u32(out, stored.len() as u32);
        put_u32(out, data.len() as u32);
        put_u16(out, name.len() as u16);
        put_u16(out, 0);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&stored);

        let mut extra = Vec::new();
        let (packed_size, real_size) = if layout.zip64_sizes {
            put_u16(&mut extra, 0x0001);
            put_u16(&mut extra, 16);
            extra.extend_from_slice(&layout.size_override.unwrap_or(data.len() as u64).to_le_bytes());
            extra.extend_from_slice(&(stored.len() as u64).to_le_bytes());
            (u32::MAX, u32::MAX)
        } else {
            (stored.len() as u32, data.len() as u32)
        };

        central.extend_from_slice(b"PK\x01\x02");
        put_u16(&mut central, 45);
        put_u16(&mut central, 45);
        put_u16(&mut central, 0);
        put_u16(&mut central, method);
        put_u16(&mut central, 0);
        put_u16(&mut central, 0x21);
        put_u32(&mut central, crc);
        put_u32(&mut central, packed_size);
        put_u32(&mut central, real_size);
        put_u16(&mut central, name.len() as u16);
        put_u16(&mut central, extra.len() as u16);
        put_u16(&mut central, 0);
        put_u16(&mut central, 0);
        put_u16(&mut central, 0);
        put_u32(&mut central, external);
        put_u32(&mut central, offset);
        central.extend_from_slice(name.as_bytes());
        central.extend_from_slice(&extra);
        count += 1;
    };

    for folder in folders {
        add(&mut out, folder, b"", false, 0x10);
    }
    for entry in entries {
        add(&mut out, entry.name, &entry.data, entry.packed, 0x20);
    }

    let cd_offset = out.len() as u64;
    let cd_size = central.len() as u64;
    out.extend_from_slice(&central);

    let (entries16, size32, offset32) = if layout.zip64_end {
        let record_offset = out.len() as u64;
        out.extend_from_slice(b"PK\x06\x06");
        out.extend_from_slice(&44u64.to_le_bytes());
        put_u16(&mut out, 45);
        put_u16(&mut out, 45);
        put_u32(&mut out, 0);
        put_u32(&mut out, 0);
        out.extend_from_slice(&(count as u64).to_le_bytes());
        out.extend_from_slice(&(count as u64).to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());

        out.extend_from_slice(b"PK\x06\x07");
        put_u32(&mut out, 0);
        out.extend_from_slice(&record_offset.to_le_bytes());
        put_u32(&mut out, 1);
        (u16::MAX, u32::MAX, u32::MAX)
    } else {
        (count, cd_size as u32, cd_offset as u32)
    };

    out.extend_from_slice(b"PK\x05\x06");
    put_u16(&mut out, 0);
    put_u16(&mut out, 0);
    put_u16(&mut out, entries16);
    put_u16(&mut out, entries16);
    put_u32(&mut out, size32);
    put_u32(&mut out, offset32);
    put_u16(&mut out, layout.comment.len() as u16);
    out.extend_from_slice(layout.comment);
    out
}

pub fn write(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, data).unwrap();
}

/// The file set shared by the format comparison tests.
pub fn sample_entries() -> Vec<Entry> {
    vec![
        Entry::plain("readme.txt", b"Welcome to the wasteland.\n"),
        Entry::packed("Data/Items.json", br#"{"items":[{"pid":1,"name":"Knife"}]}"#),
        Entry::packed("art/critters/HMJMPSAA.FRM", &[7u8; 4096]),
        Entry::plain("text/english/game/misc.msg", b"{100}{}{Hello}\n"),
    ]
}
