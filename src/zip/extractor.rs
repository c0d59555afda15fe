use flate2::read::DeflateDecoder;
use flate2::Crc;
use std::io::Read;

use crate::io::StreamIo;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};
use super::{ZipError, ZipResult};

/// ZIP file extractor
pub struct ZipExtractor<S: StreamIo> {
    parser: ZipParser<S>,
}

impl<S: StreamIo> ZipExtractor<S> {
    pub fn new(stream: S) -> ZipResult<Self> {
        Ok(Self {
            parser: ZipParser::new(stream)?,
        })
    }

    /// List all entries in the archive, folders included
    pub fn list_files(&mut self) -> ZipResult<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Extract file data to memory.
    ///
    /// Exactly `uncompressed_size` bytes must come out and their CRC-32 must
    /// match the Central Directory.
    pub fn extract_to_memory(&mut self, entry: &ZipFileEntry) -> ZipResult<Vec<u8>> {
        let data_offset = self.parser.get_data_offset(entry)?;
        let expected = entry.uncompressed_size;
        if usize::try_from(expected).is_err() {
            return Err(ZipError::Format("entry size exceeds address space"));
        }

        let data = match entry.compression_method {
            CompressionMethod::Stored => self.parser.read_at(data_offset, expected)?,
            CompressionMethod::Deflate => {
                let compressed = self.parser.read_at(data_offset, entry.compressed_size)?;

                // One byte past the expected size is enough to detect overlong output
                let mut decoder =
                    DeflateDecoder::new(compressed.as_slice()).take(expected.saturating_add(1));
                // Deflate expands at most 1032:1
                let capacity = expected.min(entry.compressed_size.saturating_mul(1032));
                let mut buf = Vec::with_capacity(capacity as usize);
                decoder
                    .read_to_end(&mut buf)
                    .map_err(|e| ZipError::Inflate(e.to_string()))?;
                buf
            }
            CompressionMethod::Unknown(method) => {
                return Err(ZipError::UnsupportedCompression(method));
            }
        };

        if data.len() as u64 != expected {
            return Err(ZipError::SizeMismatch {
                expected,
                actual: data.len() as u64,
            });
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(ZipError::ChecksumMismatch);
        }

        Ok(data)
    }

    pub fn archive_size(&self) -> u64 {
        self.parser.size()
    }

    pub fn close(&mut self) -> ZipResult<()> {
        self.parser.close()
    }
}
