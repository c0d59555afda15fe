mod local;
mod memory;

pub use local::LocalFileStream;
pub use memory::{is_placeholder, MemoryStream, EMBEDDED_NAME};

use std::io;

/// Origin for [`StreamIo::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Start,
    Current,
    End,
}

/// Byte stream the archive parser reads from.
///
/// Implementations are opened by their own constructors; after that the
/// parser only needs these operations, so the same parsing code runs over a
/// disk file or a buffer compiled into the binary.
pub trait StreamIo: Send {
    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Current position from the start of the stream.
    fn tell(&mut self) -> io::Result<u64>;

    /// Move the position, returning the new position from the start.
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> io::Result<u64>;

    /// Release the underlying resource. Further reads fail.
    fn close(&mut self) -> io::Result<()>;

    /// Whether the stream is unusable (closed or never opened).
    fn has_error(&self) -> bool;

    /// Read exactly `buf.len()` bytes starting at `offset`.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let offset = i64::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
        self.seek(offset, SeekOrigin::Start)?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("short read: wanted {} bytes, got {}", buf.len(), filled),
                ));
            }
            filled += n;
        }
        Ok(())
    }

    /// Total length of the stream. The position is restored afterwards.
    fn size(&mut self) -> io::Result<u64> {
        let pos = self.tell()?;
        let end = self.seek(0, SeekOrigin::End)?;
        let pos = i64::try_from(pos)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "position too large"))?;
        self.seek(pos, SeekOrigin::Start)?;
        Ok(end)
    }
}

impl<S: StreamIo + ?Sized> StreamIo for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn tell(&mut self) -> io::Result<u64> {
        (**self).tell()
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> io::Result<u64> {
        (**self).seek(offset, origin)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    fn has_error(&self) -> bool {
        (**self).has_error()
    }
}

pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream is closed")
}
