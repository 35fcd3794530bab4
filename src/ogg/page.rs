use crate::ogg::{
    OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_CONTINUATION, OGG_HEADER_TYPE_EOS,
    OGG_PAGE_HEADER_SIZE, OGG_SIGNATURE,
};

/// OGG Page Header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub version: u8,
    pub header_type: u8,
    /// Codec-defined progress counter, -1 when no packet ends on this page
    pub granule_position: i64,
    pub serial: u32,
    pub sequence: u32,
    pub crc: u32,
    pub segment_table: Vec<u8>,
}

/// OGG Page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub header: PageHeader,
    pub body: Vec<u8>,
}

/// Outcome of trying to frame a page at the start of a buffer
#[derive(Debug)]
pub(crate) enum Framing {
    /// A complete, checksummed page and the number of bytes it occupied
    Page(Page, usize),
    /// The buffer holds the start of a page but not all of it
    Incomplete,
    /// No valid page starts here
    Invalid,
}

impl PageHeader {
    /// Total page data size from the segment table
    pub fn body_size(&self) -> usize {
        self.segment_table.iter().map(|&x| x as usize).sum()
    }

    pub fn header_size(&self) -> usize {
        OGG_PAGE_HEADER_SIZE + self.segment_table.len()
    }
}

impl Page {
    /// Frame a page at the start of `data`, verifying version and CRC.
    pub(crate) fn frame(data: &[u8]) -> Framing {
        if data.len() < OGG_PAGE_HEADER_SIZE {
            let n = data.len().min(4);
            return if data[..n] == OGG_SIGNATURE[..n] {
                Framing::Incomplete
            } else {
                Framing::Invalid
            };
        }
        if &data[0..4] != OGG_SIGNATURE || data[4] != 0 {
            return Framing::Invalid;
        }

        let segment_count = data[26] as usize;
        let header_size = OGG_PAGE_HEADER_SIZE + segment_count;
        if data.len() < header_size {
            return Framing::Incomplete;
        }
        let segment_table = data[OGG_PAGE_HEADER_SIZE..header_size].to_vec();
        let body_size: usize = segment_table.iter().map(|&x| x as usize).sum();
        let total = header_size + body_size;
        if data.len() < total {
            return Framing::Incomplete;
        }

        let crc = u32::from_le_bytes([data[22], data[23], data[24], data[25]]);
        if page_crc(&data[..header_size], &data[header_size..total]) != crc {
            return Framing::Invalid;
        }

        let mut granule = [0u8; 8];
        granule.copy_from_slice(&data[6..14]);

        let header = PageHeader {
            version: data[4],
            header_type: data[5],
            granule_position: i64::from_le_bytes(granule),
            serial: u32::from_le_bytes([data[14], data[15], data[16], data[17]]),
            sequence: u32::from_le_bytes([data[18], data[19], data[20], data[21]]),
            crc,
            segment_table,
        };

        Framing::Page(
            Page {
                header,
                body: data[header_size..total].to_vec(),
            },
            total,
        )
    }

    pub fn serial(&self) -> u32 {
        self.header.serial
    }

    pub fn granule_position(&self) -> i64 {
        self.header.granule_position
    }

    pub fn is_bos(&self) -> bool {
        self.header.header_type & OGG_HEADER_TYPE_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header.header_type & OGG_HEADER_TYPE_EOS != 0
    }

    /// The first segment continues a packet from the previous page
    pub fn is_continuation(&self) -> bool {
        self.header.header_type & OGG_HEADER_TYPE_CONTINUATION != 0
    }

    /// Bytes this page occupies in the stream
    pub fn len(&self) -> usize {
        self.header.header_size() + self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.segment_table.is_empty()
    }
}

/// CRC lookup table for Ogg (polynomial 0x04C11DB7, not reflected).
static CRC_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ 0x04C1_1DB7
            } else {
                crc << 1
            };
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Ogg CRC-32 over `data`
pub fn crc32(data: &[u8]) -> u32 {
    crc32_update(0, data)
}

fn crc32_update(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        crc = (crc << 8) ^ CRC_TABLE[((crc >> 24) as u8 ^ byte) as usize];
    }
    crc
}

/// Page checksum: header with the CRC field zeroed, then the body
fn page_crc(header: &[u8], body: &[u8]) -> u32 {
    let crc = crc32_update(0, &header[..22]);
    let crc = crc32_update(crc, &[0u8; 4]);
    let crc = crc32_update(crc, &header[26..]);
    crc32_update(crc, body)
}
