// FLAC in Ogg (the first "fLaC" mapping)
//
// The first packet is the "fLaC" signature, optionally followed by metadata
// blocks. Every following header packet holds one metadata block. The block
// with the last-block flag ends the header packets.

use bitstream_io::{BigEndian, BitRead, BitReader};
use std::io::{Cursor, Read};

/// FLAC stream signature
pub const FLAC_SIGNATURE: &[u8; 4] = b"fLaC";

/// FLAC metadata block types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlacMetadataBlockType {
    StreamInfo = 0,
    Padding = 1,
    Application = 2,
    SeekTable = 3,
    VorbisComment = 4,
    CueSheet = 5,
    Picture = 6,
    Invalid = 127,
}

impl FlacMetadataBlockType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => FlacMetadataBlockType::StreamInfo,
            1 => FlacMetadataBlockType::Padding,
            2 => FlacMetadataBlockType::Application,
            3 => FlacMetadataBlockType::SeekTable,
            4 => FlacMetadataBlockType::VorbisComment,
            5 => FlacMetadataBlockType::CueSheet,
            6 => FlacMetadataBlockType::Picture,
            _ => FlacMetadataBlockType::Invalid,
        }
    }
}

/// FLAC metadata block header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlacMetadataBlockHeader {
    pub is_last: bool,
    pub block_type: FlacMetadataBlockType,
    pub length: u32,
}

/// FLAC metadata block
#[derive(Debug, Clone)]
pub struct FlacMetadataBlock {
    pub header: FlacMetadataBlockHeader,
    pub data: Vec<u8>,
}

impl FlacMetadataBlockHeader {
    pub const HEADER_SIZE: usize = 4;

    /// Read a metadata block header
    pub fn read<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut buffer = [0u8; Self::HEADER_SIZE];
        reader.read_exact(&mut buffer)?;

        let is_last = (buffer[0] & 0x80) != 0;
        let block_type = FlacMetadataBlockType::from_byte(buffer[0] & 0x7F);

        // Length is big-endian 24-bit
        let length = ((buffer[1] as u32) << 16) | ((buffer[2] as u32) << 8) | (buffer[3] as u32);

        Ok(FlacMetadataBlockHeader {
            is_last,
            block_type,
            length,
        })
    }
}

impl FlacMetadataBlock {
    /// Read a metadata block. Blocks cut short keep whatever data is present.
    pub fn read<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let header = FlacMetadataBlockHeader::read(reader)?;
        let mut data = Vec::with_capacity(header.length as usize);
        reader.take(header.length as u64).read_to_end(&mut data)?;

        Ok(FlacMetadataBlock { header, data })
    }
}

/// Read all metadata blocks stored back to back in `data`
pub fn read_blocks(data: &[u8]) -> Vec<FlacMetadataBlock> {
    let mut cursor = Cursor::new(data);
    let mut blocks = Vec::new();
    while (cursor.position() as usize) + FlacMetadataBlockHeader::HEADER_SIZE <= data.len() {
        match FlacMetadataBlock::read(&mut cursor) {
            Ok(block) => {
                let last = block.header.is_last;
                blocks.push(block);
                if last {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    blocks
}

/// STREAMINFO block contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    pub min_block_size: u16,
    pub max_block_size: u16,
    pub min_frame_size: u32,
    pub max_frame_size: u32,
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    pub total_samples: u64,
}

impl StreamInfo {
    pub const SIZE: usize = 34;

    pub fn parse(data: &[u8]) -> std::io::Result<Self> {
        let mut reader = BitReader::endian(Cursor::new(data), BigEndian);
        Ok(StreamInfo {
            min_block_size: reader.read::<u16>(16)?,
            max_block_size: reader.read::<u16>(16)?,
            min_frame_size: reader.read::<u32>(24)?,
            max_frame_size: reader.read::<u32>(24)?,
            sample_rate: reader.read::<u32>(20)?,
            channels: reader.read::<u8>(3)? + 1,
            bits_per_sample: reader.read::<u8>(5)? + 1,
            total_samples: reader.read::<u64>(36)?,
        })
    }
}

/// Header tracking for one FLAC stream
#[derive(Debug, Clone, Default)]
pub struct FlacHeaders {
    pub stream_info: Option<StreamInfo>,
    /// A block with the last-block flag was seen
    pub last_block_seen: bool,
}

impl FlacHeaders {
    /// Account for one header packet: the signature packet or a metadata block.
    pub fn add_header_packet(&mut self, packet: &[u8]) {
        let blocks = if packet.starts_with(FLAC_SIGNATURE) {
            read_blocks(&packet[FLAC_SIGNATURE.len()..])
        } else {
            read_blocks(packet)
        };

        for block in blocks {
            if block.header.block_type == FlacMetadataBlockType::StreamInfo && self.stream_info.is_none() {
                match StreamInfo::parse(&block.data) {
                    Ok(info) => self.stream_info = Some(info),
                    Err(e) => tracing::debug!("FLAC STREAMINFO could not be parsed: {}", e),
                }
            }
            if block.header.is_last {
                self.last_block_seen = true;
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn build_stream_info_block(is_last: bool, sample_rate: u32, channels: u8, bits: u8) -> Vec<u8> {
    let mut block = vec![if is_last { 0x80 } else { 0x00 }, 0, 0, StreamInfo::SIZE as u8];
    block.extend_from_slice(&4096u16.to_be_bytes());
    block.extend_from_slice(&4096u16.to_be_bytes());
    block.extend_from_slice(&[0, 0, 16]);
    block.extend_from_slice(&[0, 0x40, 0]);
    // sample rate (20) | channels-1 (3) | bps-1 (5) | total samples (36)
    let packed: u64 = ((sample_rate as u64) << 44)
        | (((channels - 1) as u64) << 41)
        | (((bits - 1) as u64) << 36)
        | 441_000;
    block.extend_from_slice(&packed.to_be_bytes());
    block.extend_from_slice(&[0u8; 16]);
    block
}
