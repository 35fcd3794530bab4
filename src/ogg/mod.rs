// Ogg bitstream framing
//
// OGG File Structure:
// - OGG Page Header (27 bytes)
//   - Capture Pattern: "OggS" (4 bytes)
//   - Version: 0 (1 byte)
//   - Header Type: 1=continuation, 2=bos, 4=eos (1 byte)
//   - Granule Position (8 bytes)
//   - Bitstream Serial Number (4 bytes)
//   - Page Sequence Number (4 bytes)
//   - CRC Checksum (4 bytes)
//   - Number of Page Segments (1 byte)
//   - Segment Table (variable)
//
// Logical streams are interleaved page by page; a packet may span pages.

pub mod page;
pub mod stream;
pub mod sync;

pub use page::{crc32, Page, PageHeader};
pub use stream::{Packet, PacketAssembler};
pub use sync::{PageReader, SeekResult, SyncState, BUFFER_SIZE};

// OGG signature
pub const OGG_SIGNATURE: &[u8; 4] = b"OggS";

pub const OGG_HEADER_TYPE_CONTINUATION: u8 = 0x01;
pub const OGG_HEADER_TYPE_BOS: u8 = 0x02; // Beginning of Stream
pub const OGG_HEADER_TYPE_EOS: u8 = 0x04; // End of Stream

/// Size of the fixed part of a page header
pub const OGG_PAGE_HEADER_SIZE: usize = 27;
