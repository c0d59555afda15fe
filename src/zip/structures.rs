use byteorder::{ByteOrder, LittleEndian};

use super::{ZipError, ZipResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl From<u16> for CompressionMethod {
    fn from(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            other => CompressionMethod::Unknown(other),
        }
    }
}

fn check_record(data: &[u8], signature: &[u8], size: usize, what: &'static str) -> ZipResult<()> {
    if data.len() < size || &data[..4] != signature {
        return Err(ZipError::Format(what));
    }
    Ok(())
}

/// End of Central Directory record, 22 bytes plus the archive comment.
///
/// The disk number fields are ignored: multi-disk archives aren't supported.
#[derive(Debug, Clone, Copy)]
pub struct EndRecord {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndRecord {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn parse(data: &[u8]) -> ZipResult<Self> {
        check_record(data, Self::SIGNATURE, Self::SIZE, "invalid End of Central Directory")?;
        Ok(Self {
            disk_entries: LittleEndian::read_u16(&data[8..10]),
            total_entries: LittleEndian::read_u16(&data[10..12]),
            cd_size: LittleEndian::read_u32(&data[12..16]),
            cd_offset: LittleEndian::read_u32(&data[16..20]),
        })
    }

    /// Length of the trailing comment as recorded in the record.
    pub fn comment_len(data: &[u8]) -> usize {
        LittleEndian::read_u16(&data[20..22]) as usize
    }

    /// Any saturated field means the real values live in the ZIP64 record.
    pub fn needs_zip64(&self) -> bool {
        self.disk_entries == u16::MAX
            || self.total_entries == u16::MAX
            || self.cd_size == u32::MAX
            || self.cd_offset == u32::MAX
    }
}

/// ZIP64 locator, stored right before the End of Central Directory.
#[derive(Debug, Clone, Copy)]
pub struct Zip64Locator {
    pub end_record_offset: u64,
}

impl Zip64Locator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn parse(data: &[u8]) -> ZipResult<Self> {
        check_record(data, Self::SIGNATURE, Self::SIZE, "invalid ZIP64 locator")?;
        Ok(Self {
            end_record_offset: LittleEndian::read_u64(&data[8..16]),
        })
    }
}

/// ZIP64 End of Central Directory record, fixed part.
#[derive(Debug, Clone, Copy)]
pub struct Zip64EndRecord {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EndRecord {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const SIZE: usize = 56;

    pub fn parse(data: &[u8]) -> ZipResult<Self> {
        check_record(data, Self::SIGNATURE, Self::SIZE, "invalid ZIP64 End of Central Directory")?;
        Ok(Self {
            total_entries: LittleEndian::read_u64(&data[32..40]),
            cd_size: LittleEndian::read_u64(&data[40..48]),
            cd_offset: LittleEndian::read_u64(&data[48..56]),
        })
    }
}

pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
/// Central Directory header size before the name, extra field and comment.
pub const CDFH_SIZE: usize = 46;

pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
/// Local header size before the name and extra field.
pub const LFH_SIZE: usize = 30;

/// Extra field tag carrying 64-bit sizes and offsets.
pub const ZIP64_EXTRA_TAG: u16 = 0x0001;

/// MS-DOS directory bit of the external attributes.
pub const FOLDER_ATTRIBUTE: u32 = 0x10;

/// One Central Directory entry.
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub external_attrs: u32,
}

impl ZipFileEntry {
    /// Folder entries carry the directory attribute or a trailing slash.
    pub fn is_directory(&self) -> bool {
        self.external_attrs & FOLDER_ATTRIBUTE != 0 || self.file_name.ends_with('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_record_fields() {
        let mut data = b"PK\x05\x06".to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(&138u32.to_le_bytes());
        data.extend_from_slice(&512u32.to_le_bytes());
        data.extend_from_slice(&5u16.to_le_bytes());

        let record = EndRecord::parse(&data).unwrap();
        assert_eq!(record.total_entries, 3);
        assert_eq!(record.cd_size, 138);
        assert_eq!(record.cd_offset, 512);
        assert_eq!(EndRecord::comment_len(&data), 5);
        assert!(!record.needs_zip64());

        data[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(EndRecord::parse(&data).unwrap().needs_zip64());
    }

    #[test]
    fn wrong_signature() {
        assert!(EndRecord::parse(&[0u8; 22]).is_err());
        assert!(Zip64Locator::parse(b"PK\x06\x07").is_err());
    }

    #[test]
    fn folder_detection() {
        let mut entry = ZipFileEntry {
            file_name: "maps/".to_string(),
            compression_method: CompressionMethod::from(0),
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            external_attrs: 0,
        };
        assert!(entry.is_directory());

        entry.file_name = "maps".to_string();
        assert!(!entry.is_directory());
        entry.external_attrs = FOLDER_ATTRIBUTE;
        assert!(entry.is_directory());
        assert_eq!(CompressionMethod::from(14), CompressionMethod::Unknown(14));
    }
}
