// Helpers for building Ogg data in unit tests

use crate::ogg::crc32;

/// Build one page holding `packets`, each laced completely.
pub fn build_page(serial: u32, sequence: u32, granule: i64, flags: u8, packets: &[Vec<u8>]) -> Vec<u8> {
    let mut segments = Vec::new();
    let mut body = Vec::new();
    for packet in packets {
        let mut remaining = packet.len();
        while remaining >= 255 {
            segments.push(255u8);
            remaining -= 255;
        }
        segments.push(remaining as u8);
        body.extend_from_slice(packet);
    }
    build_raw_page(serial, sequence, granule, flags, &segments, &body)
}

/// Build a page from an explicit segment table
pub fn build_raw_page(serial: u32, sequence: u32, granule: i64, flags: u8, segments: &[u8], body: &[u8]) -> Vec<u8> {
    let mut page = Vec::with_capacity(27 + segments.len() + body.len());
    page.extend_from_slice(b"OggS");
    page.push(0);
    page.push(flags);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&serial.to_le_bytes());
    page.extend_from_slice(&sequence.to_le_bytes());
    page.extend_from_slice(&0u32.to_le_bytes());
    page.push(segments.len() as u8);
    page.extend_from_slice(segments);
    page.extend_from_slice(body);

    let crc = crc32(&page);
    page[22..26].copy_from_slice(&crc.to_le_bytes());
    page
}

/// OggDS stream header packet (type byte + 56-byte struct)
pub fn oggds_header(streamtype: &str, subtype: &[u8; 4], time_unit: u64, samples_per_unit: u64, sh: [u8; 8]) -> Vec<u8> {
    let mut packet = vec![0x01u8];
    let mut st = [0u8; 8];
    st[..streamtype.len()].copy_from_slice(streamtype.as_bytes());
    packet.extend_from_slice(&st);
    packet.extend_from_slice(subtype);
    packet.extend_from_slice(&56u32.to_le_bytes());
    packet.extend_from_slice(&time_unit.to_le_bytes());
    packet.extend_from_slice(&samples_per_unit.to_le_bytes());
    packet.extend_from_slice(&0u32.to_le_bytes()); // default_len
    packet.extend_from_slice(&0u32.to_le_bytes()); // buffersize
    packet.extend_from_slice(&16u16.to_le_bytes()); // bits_per_sample
    packet.extend_from_slice(&0u16.to_le_bytes()); // padding
    packet.extend_from_slice(&sh);
    packet.extend_from_slice(&[0u8; 4]);
    packet
}

/// Vorbis-style comment packet with the given prefix (`0x03 "vorbis"` etc.)
pub fn comment_packet(prefix: &[u8], comments: &[&str]) -> Vec<u8> {
    let mut packet = prefix.to_vec();
    let vendor = b"test vendor";
    packet.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    packet.extend_from_slice(vendor);
    packet.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        packet.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        packet.extend_from_slice(comment.as_bytes());
    }
    packet
}
