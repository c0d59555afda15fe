//! Low-level ZIP archive parser.
//!
//! Reads from any source that implements [`StreamIo`]. ZIP files are read
//! from the end:
//! 1. Find the End of Central Directory at the file's end
//! 2. If ZIP64, follow the locator to the ZIP64 record
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data

use byteorder::{ByteOrder, LittleEndian};

use crate::io::StreamIo;

use super::structures::*;
use super::{ZipError, ZipResult};

/// Largest ZIP comment the format allows, bounds the backwards search.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Location of the Central Directory.
#[derive(Debug, Clone, Copy)]
pub struct CentralDirectory {
    pub offset: u64,
    pub size: u64,
    pub total_entries: u64,
}

/// Generic over the stream so the same code reads archives on disk and
/// archive images held in memory.
pub struct ZipParser<S: StreamIo> {
    stream: S,
    /// Total size of the archive in bytes
    size: u64,
}

impl<S: StreamIo> ZipParser<S> {
    pub fn new(mut stream: S) -> ZipResult<Self> {
        let size = stream.size()?;
        Ok(Self { stream, size })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Find the End of Central Directory record and its offset.
    ///
    /// Tries the comment-less position first, then scans backwards for a
    /// signature whose comment length reaches exactly to the end of file.
    pub fn find_end_record(&mut self) -> ZipResult<(EndRecord, u64)> {
        let record_size = EndRecord::SIZE as u64;
        if self.size < record_size {
            return Err(ZipError::Format("file too small to be a ZIP archive"));
        }

        let offset = self.size - record_size;
        let buf = self.read_at(offset, record_size)?;
        if &buf[..4] == EndRecord::SIGNATURE && EndRecord::comment_len(&buf) == 0 {
            return Ok((EndRecord::parse(&buf)?, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + record_size).min(self.size);
        let search_start = self.size - search_size;
        let buf = self.read_at(search_start, search_size)?;

        for i in (0..=buf.len() - EndRecord::SIZE).rev() {
            let candidate = &buf[i..];
            if &candidate[..4] == EndRecord::SIGNATURE
                && EndRecord::comment_len(candidate) == candidate.len() - EndRecord::SIZE
            {
                return Ok((EndRecord::parse(candidate)?, search_start + i as u64));
            }
        }

        Err(ZipError::Format("not a valid ZIP file"))
    }

    /// Follow the locator right before the End of Central Directory.
    pub fn read_zip64_end_record(&mut self, end_offset: u64) -> ZipResult<Zip64EndRecord> {
        let locator_offset = end_offset
            .checked_sub(Zip64Locator::SIZE as u64)
            .ok_or(ZipError::Format("missing ZIP64 locator"))?;
        let locator = Zip64Locator::parse(&self.read_at(locator_offset, Zip64Locator::SIZE as u64)?)?;

        let record = self.read_at(locator.end_record_offset, Zip64EndRecord::SIZE as u64)?;
        Zip64EndRecord::parse(&record)
    }

    /// Locate the Central Directory, using ZIP64 records when needed.
    pub fn central_directory(&mut self) -> ZipResult<CentralDirectory> {
        let (end, end_offset) = self.find_end_record()?;

        let cd = if end.needs_zip64() {
            let end64 = self.read_zip64_end_record(end_offset)?;
            CentralDirectory {
                offset: end64.cd_offset,
                size: end64.cd_size,
                total_entries: end64.total_entries,
            }
        } else {
            CentralDirectory {
                offset: end.cd_offset as u64,
                size: end.cd_size as u64,
                total_entries: end.total_entries as u64,
            }
        };

        if cd.offset.saturating_add(cd.size) > self.size {
            return Err(ZipError::Format("Central Directory extends beyond file"));
        }

        Ok(cd)
    }

    /// Every Central Directory entry, folders included, in archive order.
    pub fn list_files(&mut self) -> ZipResult<Vec<ZipFileEntry>> {
        let cd = self.central_directory()?;
        let data = self.read_at(cd.offset, cd.size)?;

        // A bogus entry count can't reserve more than the directory could hold
        let max_entries = cd.size / CDFH_SIZE as u64;
        let mut entries = Vec::with_capacity(cd.total_entries.min(max_entries) as usize);

        let mut pos = 0usize;
        for _ in 0..cd.total_entries {
            entries.push(parse_cdfh(&data, &mut pos)?);
        }

        Ok(entries)
    }

    /// Offset of the entry's data, past its Local File Header.
    ///
    /// The local name and extra field lengths may differ from the Central
    /// Directory, so the local header is always read.
    pub fn get_data_offset(&mut self, entry: &ZipFileEntry) -> ZipResult<u64> {
        let header = self.read_at(entry.lfh_offset, LFH_SIZE as u64)?;
        if &header[..4] != LFH_SIGNATURE {
            return Err(ZipError::Format("invalid Local File Header"));
        }

        let name_len = LittleEndian::read_u16(&header[26..28]) as u64;
        let extra_len = LittleEndian::read_u16(&header[28..30]) as u64;
        Ok(entry.lfh_offset + LFH_SIZE as u64 + name_len + extra_len)
    }

    /// Read `len` raw bytes at `offset`.
    pub fn read_at(&mut self, offset: u64, len: u64) -> ZipResult<Vec<u8>> {
        if offset.saturating_add(len) > self.size {
            return Err(ZipError::Format("entry data extends beyond file"));
        }
        let mut buf = vec![0u8; len as usize];
        self.stream.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }

    pub fn close(&mut self) -> ZipResult<()> {
        Ok(self.stream.close()?)
    }
}

/// Parse the Central Directory header at `*pos` and move past it.
fn parse_cdfh(data: &[u8], pos: &mut usize) -> ZipResult<ZipFileEntry> {
    let truncated = ZipError::Format("truncated Central Directory File Header");

    let header = data.get(*pos..*pos + CDFH_SIZE).ok_or(truncated)?;
    if &header[..4] != CDFH_SIGNATURE {
        return Err(ZipError::Format("invalid Central Directory File Header"));
    }

    let compression_method = LittleEndian::read_u16(&header[10..12]);
    let crc32 = LittleEndian::read_u32(&header[16..20]);
    let mut compressed_size = LittleEndian::read_u32(&header[20..24]) as u64;
    let mut uncompressed_size = LittleEndian::read_u32(&header[24..28]) as u64;
    let name_len = LittleEndian::read_u16(&header[28..30]) as usize;
    let extra_len = LittleEndian::read_u16(&header[30..32]) as usize;
    let comment_len = LittleEndian::read_u16(&header[32..34]) as usize;
    let external_attrs = LittleEndian::read_u32(&header[38..42]);
    let mut lfh_offset = LittleEndian::read_u32(&header[42..46]) as u64;

    let name_start = *pos + CDFH_SIZE;
    let extra_start = name_start + name_len;
    let end = extra_start + extra_len + comment_len;
    if end > data.len() {
        return Err(ZipError::Format("truncated Central Directory File Header"));
    }

    let file_name = String::from_utf8_lossy(&data[name_start..extra_start]).into_owned();

    let mut extra = &data[extra_start..extra_start + extra_len];
    while extra.len() >= 4 {
        let tag = LittleEndian::read_u16(&extra[0..2]);
        let field_len = (LittleEndian::read_u16(&extra[2..4]) as usize).min(extra.len() - 4);
        let mut field = &extra[4..4 + field_len];

        if tag == ZIP64_EXTRA_TAG {
            // Only the saturated header fields are present, in this order
            for value in [&mut uncompressed_size, &mut compressed_size, &mut lfh_offset] {
                if *value == u32::MAX as u64 && field.len() >= 8 {
                    *value = LittleEndian::read_u64(&field[..8]);
                    field = &field[8..];
                }
            }
        }

        extra = &extra[4 + field_len..];
    }

    *pos = end;

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        external_attrs,
    })
}
