// Ogg sync: finds page boundaries inside a rolling byte buffer

use crate::ogg::page::{Framing, Page};
use crate::ogg::OGG_SIGNATURE;
use crate::utils::io::ByteSource;
use std::io;

/// Bytes pulled from the source per refill
pub const BUFFER_SIZE: usize = 4096;

/// Result of [`SyncState::page_seek`]
#[derive(Debug)]
pub enum SeekResult {
    /// A complete page was framed and removed from the buffer
    Page(Page),
    /// More data is needed to complete the page at the buffer head
    NeedMore,
    /// This many bytes were skipped while looking for a valid page
    Skipped(usize),
}

/// Rolling buffer of raw bytes waiting to be framed into pages.
#[derive(Debug, Default)]
pub struct SyncState {
    data: Vec<u8>,
    /// Start of unconsumed data
    returned: usize,
    /// End of valid data
    fill: usize,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a writable region of at least `size` bytes at the end of the buffer.
    /// Call [`wrote`](Self::wrote) afterwards with the number of bytes filled.
    pub fn buffer(&mut self, size: usize) -> &mut [u8] {
        if self.returned > 0 {
            self.data.copy_within(self.returned..self.fill, 0);
            self.fill -= self.returned;
            self.returned = 0;
        }
        if self.data.len() < self.fill + size {
            self.data.resize(self.fill + size, 0);
        }
        &mut self.data[self.fill..self.fill + size]
    }

    pub fn wrote(&mut self, bytes: usize) {
        self.fill = (self.fill + bytes).min(self.data.len());
    }

    /// Unconsumed bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.fill - self.returned
    }

    /// Try to frame the next page from the buffered bytes.
    pub fn page_seek(&mut self) -> SeekResult {
        let available = &self.data[self.returned..self.fill];
        if available.is_empty() {
            return SeekResult::NeedMore;
        }

        match Page::frame(available) {
            Framing::Page(page, used) => {
                self.returned += used;
                SeekResult::Page(page)
            }
            Framing::Incomplete => SeekResult::NeedMore,
            Framing::Invalid => {
                // Skip to the next possible capture pattern start
                let skip = available[1..]
                    .windows(OGG_SIGNATURE.len())
                    .position(|w| w == OGG_SIGNATURE)
                    .map(|p| p + 1)
                    .unwrap_or_else(|| partial_signature_start(available));
                self.returned += skip;
                SeekResult::Skipped(skip)
            }
        }
    }

    /// Drop everything buffered
    pub fn reset(&mut self) {
        self.returned = 0;
        self.fill = 0;
    }
}

/// Offset of a trailing partial "OggS" so it survives the skip
fn partial_signature_start(data: &[u8]) -> usize {
    for keep in (1..OGG_SIGNATURE.len()).rev() {
        if data.len() > keep && data[data.len() - keep..] == OGG_SIGNATURE[..keep] {
            return data.len() - keep;
        }
    }
    data.len()
}

/// Pulls pages out of a [`ByteSource`].
#[derive(Debug, Default)]
pub struct PageReader {
    sync: SyncState,
    sync_warned: bool,
    skipped_bytes: u64,
}

impl PageReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the next complete page. `Ok(None)` once the source is exhausted
    /// and no complete page remains buffered.
    pub fn read_page<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> io::Result<Option<Page>> {
        loop {
            match self.sync.page_seek() {
                SeekResult::Page(page) => return Ok(Some(page)),
                SeekResult::Skipped(count) => {
                    self.skipped_bytes += count as u64;
                    if !self.sync_warned {
                        tracing::warn!(
                            source = source.name(),
                            "Could not find the next Ogg page. This indicates a damaged Ogg/Ogm file. Will try to continue."
                        );
                        self.sync_warned = true;
                    } else {
                        tracing::debug!(source = source.name(), skipped = count, "Ogg sync lost again");
                    }
                }
                SeekResult::NeedMore => {
                    let buf = self.sync.buffer(BUFFER_SIZE);
                    let read = source.read(buf)?;
                    if read == 0 {
                        return Ok(None);
                    }
                    self.sync.wrote(read);
                }
            }
        }
    }

    /// Forget buffered data, e.g. after the source was rewound
    pub fn reset(&mut self) {
        self.sync.reset();
    }

    /// Total bytes skipped while resynchronising
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_page;
    use crate::utils::io::FileSource;
    use std::io::Cursor;

    #[test]
    fn test_page_seek_needs_more() {
        let page = build_page(5, 0, 0, 0, &[vec![1u8; 100]]);
        let mut sync = SyncState::new();
        let buf = sync.buffer(50);
        buf.copy_from_slice(&page[..50]);
        sync.wrote(50);
        assert!(matches!(sync.page_seek(), SeekResult::NeedMore));

        let rest = page.len() - 50;
        let buf = sync.buffer(rest);
        buf.copy_from_slice(&page[50..]);
        sync.wrote(rest);
        match sync.page_seek() {
            SeekResult::Page(p) => assert_eq!(p.serial(), 5),
            other => panic!("expected page, got {:?}", other),
        }
        assert_eq!(sync.buffered(), 0);
    }

    #[test]
    fn test_page_seek_skips_garbage() {
        let mut data = b"garbage!".to_vec();
        data.extend(build_page(9, 0, 0, 0, &[b"abc".to_vec()]));
        let mut sync = SyncState::new();
        let buf = sync.buffer(data.len());
        buf.copy_from_slice(&data);
        sync.wrote(data.len());

        match sync.page_seek() {
            SeekResult::Skipped(n) => assert_eq!(n, 8),
            other => panic!("expected skip, got {:?}", other),
        }
        assert!(matches!(sync.page_seek(), SeekResult::Page(_)));
    }

    #[test]
    fn test_reader_reads_all_pages() {
        let mut data = Vec::new();
        for seq in 0..3 {
            data.extend(build_page(1, seq, seq as i64, 0, &[vec![seq as u8; 3000]]));
        }
        let mut source = FileSource::new(Cursor::new(data), "mem").unwrap();
        let mut reader = PageReader::new();

        let mut sequences = Vec::new();
        while let Some(page) = reader.read_page(&mut source).unwrap() {
            sequences.push(page.header.sequence);
        }
        assert_eq!(sequences, vec![0, 1, 2]);
    }

    #[test]
    fn test_reader_recovers_from_corrupt_page() {
        let mut data = build_page(1, 0, 0, 0, &[b"first".to_vec()]);
        let mut corrupt = build_page(1, 1, 1, 0, &[b"second".to_vec()]);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0x55;
        data.extend(corrupt);
        data.extend(build_page(1, 2, 2, 0, &[b"third".to_vec()]));

        let mut source = FileSource::new(Cursor::new(data), "mem").unwrap();
        let mut reader = PageReader::new();
        let mut bodies = Vec::new();
        while let Some(page) = reader.read_page(&mut source).unwrap() {
            bodies.push(page.body);
        }
        assert_eq!(bodies, vec![b"first".to_vec(), b"third".to_vec()]);
        assert!(reader.skipped_bytes() > 0);
    }

    #[test]
    fn test_reader_empty_input() {
        let mut source = FileSource::new(Cursor::new(Vec::new()), "mem").unwrap();
        let mut reader = PageReader::new();
        assert!(reader.read_page(&mut source).unwrap().is_none());
    }
}
