use std::io;

use super::{closed_error, SeekOrigin, StreamIo};
use crate::error::ConstructionError;

/// Magic name of the archive compiled into the binary.
pub const EMBEDDED_NAME: &str = "$Embedded";

/// Payloads at or below this size can't be a real archive image.
const MIN_PAYLOAD_LEN: usize = 100;

/// Stream over a buffer that lives for the whole program.
pub struct MemoryStream {
    buf: &'static [u8],
    pos: u64,
    open: bool,
}

impl MemoryStream {
    pub fn new(buf: &'static [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            open: true,
        }
    }

    /// Open the embedded archive image.
    ///
    /// Only [`EMBEDDED_NAME`] resolves. A payload that still carries the
    /// build-time placeholder means the resources were never baked in.
    pub fn open_embedded(name: &str, payload: &'static [u8]) -> Result<Self, ConstructionError> {
        if name != EMBEDDED_NAME {
            return Err(ConstructionError::InvalidPath(name.to_string()));
        }
        if payload.len() <= MIN_PAYLOAD_LEN || is_placeholder(payload) {
            return Err(ConstructionError::EmbeddedPlaceholder);
        }
        Ok(Self::new(payload))
    }
}

/// Byte 4 zero, bytes 5..47 `0x42`, byte 47 zero.
pub fn is_placeholder(payload: &[u8]) -> bool {
    payload.len() >= 48
        && payload[4] == 0x00
        && payload[5..47].iter().all(|&b| b == 0x42)
        && payload[47] == 0x00
}

impl StreamIo for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.open {
            return Err(closed_error());
        }

        let start = usize::try_from(self.pos).unwrap_or(usize::MAX).min(self.buf.len());
        let n = buf.len().min(self.buf.len() - start);
        buf[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn tell(&mut self) -> io::Result<u64> {
        if !self.open {
            return Err(closed_error());
        }
        Ok(self.pos)
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> io::Result<u64> {
        if !self.open {
            return Err(closed_error());
        }

        let base = match origin {
            SeekOrigin::Start => 0,
            SeekOrigin::Current => self.pos as i128,
            SeekOrigin::End => self.buf.len() as i128,
        };
        let target = base + offset as i128;
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of buffer",
            ));
        }

        self.pos = target as u64;
        Ok(self.pos)
    }

    fn close(&mut self) -> io::Result<()> {
        if !self.open {
            return Err(closed_error());
        }
        self.open = false;
        Ok(())
    }

    fn has_error(&self) -> bool {
        !self.open
    }
}
