//! Positional byte source consumed by the stream reader.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// A seekable, readable resource the reader pulls raw bytes from.
///
/// Implementations may block on I/O. The reader seeks before every read, so
/// sources do not need to track position between calls.
pub trait ByteSource {
    /// Current byte offset.
    fn tell(&mut self) -> io::Result<u64>;

    /// Move to an absolute byte offset.
    fn seek(&mut self, offset: u64) -> io::Result<()>;

    /// Read up to `buffer.len()` bytes. `Ok(0)` means end of data.
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Read until `buffer` is full or the source runs dry.
    ///
    /// Returns the number of bytes read, which is short only at end of data.
    fn read_full(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

/// [`ByteSource`] over any `Read + Seek` handle (files, cursors).
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: Read + Seek> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl IoSource<File> {
    /// Open a file on disk as a byte source.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        File::open(path).map(Self::new)
    }
}

impl<R: Read + Seek> ByteSource for IoSource<R> {
    fn tell(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset)).map(|_| ())
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buffer)
    }
}
