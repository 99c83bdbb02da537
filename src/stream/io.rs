/*
 *  stream/io.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Backing stores for frame streams: memory or a file
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Append-only byte store with positional reads
pub trait StreamIO: Send {
    /// Append bytes at the end of the store
    fn append(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Read up to `buf.len()` bytes starting at `offset`.
    /// Returns how many were read; fewer than requested only at end of data.
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Total bytes stored
    fn len(&self) -> io::Result<u64>;
}

/// Transient in-memory store
#[derive(Debug, Default, Clone)]
pub struct MemStreamIO {
    data: Vec<u8>,
}

impl MemStreamIO {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamIO for MemStreamIO {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let start = (offset as usize).min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }
}

/// File backed store, used for pre-encoded sources and the external sink
#[derive(Debug)]
pub struct FileStreamIO {
    file: File,
}

impl FileStreamIO {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Open an existing stream file for playback
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }

    /// Create (or truncate) a stream file for writing
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file))
    }
}

impl StreamIO for FileStreamIO {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(buf)
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(io: &mut dyn StreamIO) {
        io.append(b"hello").unwrap();
        io.append(b" world").unwrap();

        let mut buf = [0u8; 5];
        assert_eq!(io.read_at(&mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"world");

        let mut buf = [0u8; 8];
        assert_eq!(io.read_at(&mut buf, 8).unwrap(), 3);
        assert_eq!(&buf[..3], b"rld");

        assert_eq!(io.read_at(&mut buf, 100).unwrap(), 0);
    }

    #[test]
    fn test_mem_stream_io() {
        let mut io = MemStreamIO::new();
        exercise(&mut io);
        assert_eq!(io.len().unwrap(), 11);
    }

    #[test]
    fn test_file_stream_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.stream");
        let mut io = FileStreamIO::create(&path).unwrap();
        exercise(&mut io);
        assert_eq!(io.len().unwrap(), 11);
        drop(io);

        let mut reopened = FileStreamIO::open(&path).unwrap();
        let mut buf = [0u8; 11];
        assert_eq!(reopened.read_at(&mut buf, 0).unwrap(), 11);
        assert_eq!(&buf, b"hello world");
    }
}
