use std::io::{self, SeekFrom};
use std::path::Path;

use super::{closed_error, SeekOrigin, StreamIo};
use crate::disk::DiskFile;

/// Stream over a file on disk.
pub struct LocalFileStream {
    file: Option<DiskFile>,
    write_time: u64,
}

impl LocalFileStream {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = DiskFile::open(path)?;
        let write_time = file.write_time();
        Ok(Self {
            file: Some(file),
            write_time,
        })
    }

    pub fn write_time(&self) -> u64 {
        self.write_time
    }

    fn file(&mut self) -> io::Result<&mut DiskFile> {
        self.file.as_mut().ok_or_else(closed_error)
    }
}

impl StreamIo for LocalFileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read(buf)
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.file()?.pos()
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> io::Result<u64> {
        let pos = match origin {
            SeekOrigin::Start => SeekFrom::Start(u64::try_from(offset).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "negative seek from start")
            })?),
            SeekOrigin::Current => SeekFrom::Current(offset),
            SeekOrigin::End => SeekFrom::End(offset),
        };
        self.file()?.set_pos(pos)
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.take().map(drop).ok_or_else(closed_error)
    }

    fn has_error(&self) -> bool {
        self.file.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let mut stream = LocalFileStream::open(&path).unwrap();
        assert_eq!(stream.size().unwrap(), 10);
        assert_eq!(stream.seek(-4, SeekOrigin::End).unwrap(), 6);
        assert_eq!(stream.seek(1, SeekOrigin::Current).unwrap(), 7);

        let mut buf = [0u8; 3];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"789");

        stream.read_exact_at(2, &mut buf).unwrap();
        assert_eq!(&buf, b"234");
    }

    #[test]
    fn closed_stream_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.bin");
        std::fs::write(&path, b"x").unwrap();

        let mut stream = LocalFileStream::open(&path).unwrap();
        assert!(!stream.has_error());
        stream.close().unwrap();
        assert!(stream.has_error());
        assert!(stream.tell().is_err());
        assert!(stream.close().is_err());
    }
}
