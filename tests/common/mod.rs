//! Shared helpers for integration tests.
//!
//! [`OggWriter`] lays out complete Ogg pages with valid CRCs so that test
//! files can be synthesised in memory.

#![allow(dead_code)]

use ogmdemux::ogg::crc32;
use ogmdemux::utils::io::FileSource;
use ogmdemux::{FileStatus, MediaPacket, OgmReader, Packetizer as _, PacketizerId};
use std::collections::HashMap;
use std::io::Cursor;

pub const BOS: u8 = 0x02;
pub const EOS: u8 = 0x04;

pub type MemorySource = FileSource<Cursor<Vec<u8>>>;

/// Builds an Ogg file page by page, tracking the sequence number per serial.
#[derive(Default)]
pub struct OggWriter {
    data: Vec<u8>,
    sequences: HashMap<u32, u32>,
}

impl OggWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page holding `packets`, each laced completely.
    pub fn page(mut self, serial: u32, granule: i64, flags: u8, packets: &[Vec<u8>]) -> Self {
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

        let sequence = self.sequences.entry(serial).or_insert(0);
        let mut page = Vec::with_capacity(27 + segments.len() + body.len());
        page.extend_from_slice(b"OggS");
        page.push(0);
        page.push(flags);
        page.extend_from_slice(&granule.to_le_bytes());
        page.extend_from_slice(&serial.to_le_bytes());
        page.extend_from_slice(&sequence.to_le_bytes());
        page.extend_from_slice(&0u32.to_le_bytes());
        page.push(segments.len() as u8);
        page.extend_from_slice(&segments);
        page.extend_from_slice(&body);
        *sequence += 1;

        let crc = crc32(&page);
        page[22..26].copy_from_slice(&crc.to_le_bytes());
        self.data.extend_from_slice(&page);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }

    pub fn source(self) -> MemorySource {
        memory_source(self.data)
    }
}

pub fn memory_source(data: Vec<u8>) -> MemorySource {
    FileSource::new(Cursor::new(data), "memory.ogm").expect("in-memory source")
}

pub fn vorbis_identification(channels: u8, rate: u32) -> Vec<u8> {
    let mut packet = b"\x01vorbis".to_vec();
    packet.extend_from_slice(&0u32.to_le_bytes());
    packet.push(channels);
    packet.extend_from_slice(&rate.to_le_bytes());
    packet.extend_from_slice(&[0; 13]);
    packet
}

/// Vorbis-style comment packet behind `prefix` (`0x03 "vorbis"`, `0x81 "theora"`, `0x03` for OggDS)
pub fn comment_packet(prefix: &[u8], comments: &[&str]) -> Vec<u8> {
    let mut packet = prefix.to_vec();
    packet.resize(7, 0);
    let vendor = b"ogmdemux tests";
    packet.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    packet.extend_from_slice(vendor);
    packet.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for comment in comments {
        packet.extend_from_slice(&(comment.len() as u32).to_le_bytes());
        packet.extend_from_slice(comment.as_bytes());
    }
    packet
}

/// Theora identification header with square pixels
pub fn theora_identification(mbw: u16, mbh: u16, frn: u32, frd: u32) -> Vec<u8> {
    let mut packet = b"\x80theora".to_vec();
    packet.extend_from_slice(&[3, 2, 1]);
    packet.extend_from_slice(&mbw.to_be_bytes());
    packet.extend_from_slice(&mbh.to_be_bytes());
    packet.extend_from_slice(&(mbw as u32 * 16).to_be_bytes()[1..]);
    packet.extend_from_slice(&(mbh as u32 * 16).to_be_bytes()[1..]);
    packet.extend_from_slice(&[0, 0]);
    packet.extend_from_slice(&frn.to_be_bytes());
    packet.extend_from_slice(&frd.to_be_bytes());
    packet.extend_from_slice(&1u32.to_be_bytes()[1..]);
    packet.extend_from_slice(&1u32.to_be_bytes()[1..]);
    packet.push(0);
    packet.extend_from_slice(&[0, 0, 0]);
    // quality 32, kfgshift 6, pixel format 0
    packet.extend_from_slice(&((32u16 << 10) | (6 << 5)).to_be_bytes());
    packet
}

pub fn kate_identification(nheaders: u8, language: &str) -> Vec<u8> {
    let mut packet = vec![0u8; 64];
    packet[0] = 0x80;
    packet[1..8].copy_from_slice(b"kate\0\0\0");
    packet[10] = 5;
    packet[11] = nheaders;
    packet[15] = 32;
    packet[24..28].copy_from_slice(&1000u32.to_le_bytes());
    packet[28..32].copy_from_slice(&1u32.to_le_bytes());
    packet[32..32 + language.len()].copy_from_slice(language.as_bytes());
    packet
}

/// OggDS stream header: type byte plus the 56-byte header struct
pub fn oggds_header(streamtype: &str, subtype: &[u8; 4], time_unit: u64, samples_per_unit: u64, specific: [u8; 8]) -> Vec<u8> {
    let mut packet = vec![0x01u8];
    let mut st = [0u8; 8];
    st[..streamtype.len()].copy_from_slice(streamtype.as_bytes());
    packet.extend_from_slice(&st);
    packet.extend_from_slice(subtype);
    packet.extend_from_slice(&56u32.to_le_bytes());
    packet.extend_from_slice(&time_unit.to_le_bytes());
    packet.extend_from_slice(&samples_per_unit.to_le_bytes());
    packet.extend_from_slice(&0u32.to_le_bytes());
    packet.extend_from_slice(&0u32.to_le_bytes());
    packet.extend_from_slice(&16u16.to_le_bytes());
    packet.extend_from_slice(&0u16.to_le_bytes());
    packet.extend_from_slice(&specific);
    packet.extend_from_slice(&[0u8; 4]);
    packet
}

/// OggDS audio stream specific block: channels, block align, bytes per second
pub fn audio_specific(channels: u16, block_align: u16, avg_bytes_per_sec: u32) -> [u8; 8] {
    let mut specific = [0u8; 8];
    specific[0..2].copy_from_slice(&channels.to_le_bytes());
    specific[2..4].copy_from_slice(&block_align.to_le_bytes());
    specific[4..8].copy_from_slice(&avg_bytes_per_sec.to_le_bytes());
    specific
}

/// OggDS video stream specific block: width, height
pub fn video_specific(width: u32, height: u32) -> [u8; 8] {
    let mut specific = [0u8; 8];
    specific[0..4].copy_from_slice(&width.to_le_bytes());
    specific[4..8].copy_from_slice(&height.to_le_bytes());
    specific
}

/// OggDS data packet with a one byte duration field
pub fn oggds_data(duration: u8, payload: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x40, duration];
    packet.extend_from_slice(payload);
    packet
}

/// Drive `reader` to the end, draining every packetizer after each page.
pub fn demux_all(reader: &mut OgmReader<MemorySource>) -> HashMap<usize, Vec<MediaPacket>> {
    let outputs: Vec<(usize, PacketizerId)> = reader
        .streams()
        .iter()
        .filter_map(|d| d.packetizer.map(|id| (d.track_id, id)))
        .collect();

    let mut packets: HashMap<usize, Vec<MediaPacket>> = HashMap::new();
    loop {
        let status = reader.read().expect("read");
        for &(track, id) in &outputs {
            let packetizer = reader.packetizers_mut().get_mut(id).expect("packetizer");
            while let Some(packet) = packetizer.get_packet() {
                packets.entry(track).or_default().push(packet);
            }
        }
        if status == FileStatus::Done {
            return packets;
        }
    }
}
