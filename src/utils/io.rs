// I/O utilities: the byte source the reader pulls from, plus integer helpers
// for the little-endian structures embedded in header packets

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Origin for [`ByteSource::set_file_pointer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Beginning,
    Current,
    End,
}

/// Sequential, seekable byte stream supplied by the host I/O layer.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes. Returns 0 at end of input.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Move the read position. Returns the new absolute position.
    fn set_file_pointer(&mut self, offset: i64, origin: SeekOrigin) -> io::Result<u64>;

    /// Current absolute read position
    fn file_pointer(&mut self) -> io::Result<u64>;

    /// Total size of the source in bytes
    fn size(&self) -> u64;

    /// Name used in log messages
    fn name(&self) -> &str {
        "<stream>"
    }
}

/// [`ByteSource`] over anything that implements `Read + Seek`.
pub struct FileSource<R> {
    inner: R,
    size: u64,
    name: String,
}

impl FileSource<BufReader<File>> {
    /// Open a file on disk
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::new(BufReader::new(file), path.display().to_string())
    }
}

impl<R: Read + Seek> FileSource<R> {
    /// Wrap a reader. The size is taken by seeking to the end once.
    pub fn new(mut inner: R, name: impl Into<String>) -> io::Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(FileSource {
            inner,
            size,
            name: name.into(),
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for FileSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn set_file_pointer(&mut self, offset: i64, origin: SeekOrigin) -> io::Result<u64> {
        let target = match origin {
            SeekOrigin::Beginning => SeekFrom::Start(offset.max(0) as u64),
            SeekOrigin::Current => SeekFrom::Current(offset),
            SeekOrigin::End => SeekFrom::End(offset),
        };
        self.inner.seek(target)
    }

    fn file_pointer(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Read little-endian 32-bit integer
pub fn read_le_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer)?;
    Ok(u32::from_le_bytes(buffer))
}

/// Little-endian 16-bit integer at `offset`, if the slice is long enough
pub fn le_u16_at(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Little-endian 32-bit integer at `offset`
pub fn le_u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Little-endian 64-bit integer at `offset`
pub fn le_u64_at(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset + 8)?;
    let mut buffer = [0u8; 8];
    buffer.copy_from_slice(bytes);
    Some(u64::from_le_bytes(buffer))
}

/// Big-endian 32-bit integer at `offset`
pub fn be_u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
