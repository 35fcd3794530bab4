// OggDS ("OGM") stream headers and packet framing
//
// OggDS streams start with a header packet: type byte 0x01 followed by a
// fixed 56-byte little-endian struct:
//
//   streamtype[8]  "video", "audio", "text"
//   subtype[4]     fourcc (video) or hex codec id as text (audio)
//   size           u32
//   time_unit      u64, in 100ns units
//   samples_per_unit u64
//   default_len    u32
//   buffersize     u32
//   bits_per_sample u16
//   padding        u16
//   video: width u32, height u32 | audio: channels u16, blockalign u16, avgbytespersec u32
//   (4 bytes alignment padding)
//
// Every packet begins with a flag byte:
//   bits 0-1  type (1 = header, 3 = comment, 5 = codebook when bit 2 is used)
//   bit 1 + bits 6-7  number of duration bytes that follow
//   bit 3     sync point

use crate::utils::io::{le_u16_at, le_u32_at, le_u64_at};

pub const STREAM_HEADER_SIZE: usize = 56;

pub const PACKET_TYPE_HEADER: u8 = 0x01;
pub const PACKET_TYPE_COMMENT: u8 = 0x03;
pub const PACKET_TYPE_CODEBOOK: u8 = 0x05;
pub const PACKET_TYPE_BITS: u8 = 0x07;
pub const PACKET_LEN_BITS01: u8 = 0xC0;
pub const PACKET_LEN_BITS2: u8 = 0x02;
pub const PACKET_IS_SYNCPOINT: u8 = 0x08;

/// Decoded OggDS stream header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub streamtype: [u8; 8],
    pub subtype: [u8; 4],
    pub size: u32,
    /// Duration of one unit in 100ns ticks
    pub time_unit: u64,
    pub samples_per_unit: u64,
    pub default_len: u32,
    pub buffersize: u32,
    pub bits_per_sample: u16,
    /// Raw bytes of the video/audio union
    pub specific: [u8; 8],
}

impl StreamHeader {
    /// Parse the header from a complete header packet (including the type byte).
    pub fn parse(packet: &[u8]) -> Option<Self> {
        if packet.len() < 1 + STREAM_HEADER_SIZE || packet[0] & PACKET_TYPE_BITS != PACKET_TYPE_HEADER {
            return None;
        }
        let data = &packet[1..];

        let mut streamtype = [0u8; 8];
        streamtype.copy_from_slice(&data[0..8]);
        let mut subtype = [0u8; 4];
        subtype.copy_from_slice(&data[8..12]);
        let mut specific = [0u8; 8];
        specific.copy_from_slice(&data[44..52]);

        Some(StreamHeader {
            streamtype,
            subtype,
            size: le_u32_at(data, 12)?,
            time_unit: le_u64_at(data, 16)?,
            samples_per_unit: le_u64_at(data, 24)?,
            default_len: le_u32_at(data, 32)?,
            buffersize: le_u32_at(data, 36)?,
            bits_per_sample: le_u16_at(data, 40)?,
            specific,
        })
    }

    /// Stream type with trailing NULs removed
    pub fn stream_type(&self) -> String {
        String::from_utf8_lossy(&self.streamtype)
            .trim_end_matches('\0')
            .to_string()
    }

    pub fn fourcc(&self) -> String {
        String::from_utf8_lossy(&self.subtype)
            .trim_end_matches('\0')
            .to_string()
    }

    pub fn video_width(&self) -> u32 {
        le_u32_at(&self.specific, 0).unwrap_or(0)
    }

    pub fn video_height(&self) -> u32 {
        le_u32_at(&self.specific, 4).unwrap_or(0)
    }

    pub fn audio_channels(&self) -> u16 {
        le_u16_at(&self.specific, 0).unwrap_or(0)
    }

    /// Audio codec id, read from the subtype as hex text
    pub fn audio_codec_id(&self) -> u32 {
        parse_hex_prefix(&self.subtype)
    }

    /// Frames per second for video streams
    pub fn fps(&self) -> Option<f64> {
        if self.time_unit == 0 {
            None
        } else {
            Some(10_000_000.0 / self.time_unit as f64)
        }
    }
}

/// Leading hexadecimal number of `text`, 0 if there is none.
///
/// Leading whitespace and a `0x` prefix are accepted.
pub fn parse_hex_prefix(text: &[u8]) -> u32 {
    let mut rest = text;
    while let Some((first, tail)) = rest.split_first() {
        if first.is_ascii_whitespace() {
            rest = tail;
        } else {
            break;
        }
    }
    if rest.len() >= 2 && rest[0] == b'0' && (rest[1] == b'x' || rest[1] == b'X') {
        rest = &rest[2..];
    }

    let mut value: u32 = 0;
    for &byte in rest {
        let digit = match (byte as char).to_digit(16) {
            Some(d) => d,
            None => break,
        };
        value = value.wrapping_mul(16).wrapping_add(digit);
    }
    value
}

/// Packet type bits (header / comment / data)
pub fn packet_type(packet: &[u8]) -> Option<u8> {
    packet.first().map(|b| b & 0x03)
}

/// Header and comment packets carry no media
pub fn is_header_or_comment(packet: &[u8]) -> bool {
    matches!(packet_type(packet), Some(PACKET_TYPE_HEADER) | Some(PACKET_TYPE_COMMENT))
}

/// Number of duration bytes announced in the flag byte
pub fn duration_len(flags: u8) -> usize {
    (((flags & PACKET_LEN_BITS01) >> 6) | ((flags & PACKET_LEN_BITS2) << 1)) as usize
}

/// Decode the duration field of a data packet.
///
/// Returns `(duration, duration_len)`; the payload starts at
/// `1 + duration_len`. Byte 1 is the least significant duration byte.
/// A packet too short for the announced length yields a duration of 0.
pub fn duration_and_len(packet: &[u8]) -> (i64, usize) {
    let Some(&flags) = packet.first() else {
        return (0, 0);
    };
    let len = duration_len(flags);

    let mut duration: i64 = 0;
    if len > 0 && packet.len() >= len + 1 {
        for i in 0..len {
            duration = (duration << 8) + packet[len - i] as i64;
        }
    }
    (duration, len)
}

/// Media payload of a data packet
pub fn payload(packet: &[u8]) -> &[u8] {
    let (_, len) = duration_and_len(packet);
    packet.get(1 + len..).unwrap_or(&[])
}
