// Per-stream demuxer state
//
// One `Demuxer` exists for every logical stream found in the file. The codec
// specific parts live in `CodecState`; header collection is shared by all
// codecs and implemented here. Steady-state packet handling is in `process`,
// codec initialisation and packetizer setup in `setup`.

mod process;
mod setup;

use crate::codec::flac::FlacHeaders;
use crate::codec::kate::KateIdentification;
use crate::codec::theora::TheoraIdentification;
use crate::codec::CodecKind;
use crate::ogg::PacketAssembler;
use crate::oggds::StreamHeader;
use crate::packet::PacketizerId;
use serde::Serialize;

/// Lifecycle of a logical stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamState {
    /// Registered, no header packet stored yet
    Discovered,
    CollectingHeaders,
    SteadyState,
    Eos,
    /// Headers were declared read without being complete
    Abandoned,
}

/// Codec specific parsing state
#[derive(Debug, Clone)]
pub(crate) enum CodecState {
    Plain,
    Theora(TheoraIdentification),
    Kate(KateIdentification),
    Flac(FlacHeaders),
    OggDs(StreamHeader),
    MsComp {
        header: StreamHeader,
        frames_since_granulepos_change: i64,
    },
}

/// State machine for one logical stream.
#[derive(Debug)]
pub struct Demuxer {
    pub serial: u32,
    pub track_id: usize,
    pub codec: CodecKind,
    pub(crate) state: CodecState,
    /// The caller asked for this track
    pub in_use: bool,
    pub eos: bool,
    pub headers_read: bool,
    headers_forced: bool,
    pub(crate) headers: Vec<Vec<u8>>,
    /// Data packets needed before steady state (AVC parameter sets)
    pub(crate) nh_packets: Vec<Vec<u8>>,
    pub(crate) num_header_packets: usize,
    pub(crate) num_non_header_packets: usize,
    pub last_granulepos: i64,
    /// Nanoseconds
    pub default_duration: i64,
    pub language: Option<String>,
    pub title: Option<String>,
    pub display_width: u32,
    pub display_height: u32,
    pub units_processed: u64,
    pub packetizer: Option<PacketizerId>,
    pub(crate) assembler: PacketAssembler,
    /// Header packets stored from the BOS page. These never reach
    /// steady state because BOS pages are skipped there.
    headers_on_bos: usize,
    /// Header packets skipped by position during the current pass
    headers_skipped: usize,
}

impl Demuxer {
    pub fn new(serial: u32, track_id: usize, codec: CodecKind, assembler: PacketAssembler) -> Self {
        let (num_header_packets, num_non_header_packets) = match codec {
            CodecKind::Vorbis | CodecKind::Theora => (3, 0),
            // Updated from the identification header
            CodecKind::Kate => (1, 0),
            // Grows until the last metadata block shows up
            CodecKind::Flac => (1, 0),
            CodecKind::AvcVideo => (2, 3),
            _ => (2, 0),
        };
        let state = match codec {
            CodecKind::Flac => CodecState::Flac(FlacHeaders::default()),
            _ => CodecState::Plain,
        };

        Demuxer {
            serial,
            track_id,
            codec,
            state,
            in_use: false,
            eos: false,
            headers_read: false,
            headers_forced: false,
            headers: Vec::new(),
            nh_packets: Vec::new(),
            num_header_packets,
            num_non_header_packets,
            last_granulepos: 0,
            default_duration: 0,
            language: None,
            title: None,
            display_width: 0,
            display_height: 0,
            units_processed: 0,
            packetizer: None,
            assembler,
            headers_on_bos: 0,
            headers_skipped: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        if self.headers.is_empty() {
            StreamState::Discovered
        } else if !self.headers_read {
            StreamState::CollectingHeaders
        } else if self.headers_forced {
            StreamState::Abandoned
        } else if self.eos {
            StreamState::Eos
        } else {
            StreamState::SteadyState
        }
    }

    /// Header packets collected so far
    pub fn headers(&self) -> &[Vec<u8>] {
        &self.headers
    }

    pub fn non_header_packets(&self) -> &[Vec<u8>] {
        &self.nh_packets
    }

    pub fn num_header_packets(&self) -> usize {
        self.num_header_packets
    }

    pub fn num_non_header_packets(&self) -> usize {
        self.num_non_header_packets
    }

    pub fn is_abandoned(&self) -> bool {
        self.headers_forced
    }

    pub fn theora(&self) -> Option<&TheoraIdentification> {
        match &self.state {
            CodecState::Theora(header) => Some(header),
            _ => None,
        }
    }

    pub fn kate(&self) -> Option<&KateIdentification> {
        match &self.state {
            CodecState::Kate(header) => Some(header),
            _ => None,
        }
    }

    pub fn flac(&self) -> Option<&FlacHeaders> {
        match &self.state {
            CodecState::Flac(headers) => Some(headers),
            _ => None,
        }
    }

    /// OggDS stream header, for OggDS based streams
    pub fn stream_header(&self) -> Option<&StreamHeader> {
        match &self.state {
            CodecState::OggDs(header) | CodecState::MsComp { header, .. } => Some(header),
            _ => None,
        }
    }

    /// Whether `packet` is one of this stream's header packets
    pub fn is_header_packet(&self, packet: &[u8]) -> bool {
        match (&self.codec, &self.state) {
            (CodecKind::Flac, CodecState::Flac(flac)) => !flac.last_block_seen,
            (CodecKind::Theora, _) => matches!(packet.first(), Some(0x80..=0x82)),
            (CodecKind::Kate, _) => packet.first().is_some_and(|b| b & 0x80 != 0),
            _ => {
                packet.first().is_some_and(|b| b & 0x01 != 0)
                    && self.headers.len() < self.num_header_packets
            }
        }
    }

    /// Store a header packet
    pub(crate) fn add_header(&mut self, packet: Vec<u8>) {
        if let CodecState::Flac(flac) = &mut self.state {
            flac.add_header_packet(&packet);
            let stored = self.headers.len() + 1;
            self.num_header_packets = if flac.last_block_seen { stored } else { stored + 1 };
        }
        self.headers.push(packet);
    }

    /// Drain the packets assembled so far while headers are being collected.
    pub fn process_header_page(&mut self) {
        while let Some(packet) = self.assembler.packet_out() {
            self.eos |= packet.eos;

            if !self.is_header_packet(&packet.data) {
                if self.nh_packets.len() < self.num_non_header_packets {
                    self.nh_packets.push(packet.data);
                    continue;
                }

                tracing::warn!(
                    track = self.track_id,
                    "Missing header/comment packets for stream. This file is broken but should be muxed correctly."
                );
                self.headers_read = true;
                self.headers_forced = true;
                self.assembler.reset();
                return;
            }

            self.add_header(packet.data);
        }

        if self.headers.len() == self.num_header_packets && self.nh_packets.len() >= self.num_non_header_packets {
            tracing::debug!(track = self.track_id, headers = self.headers.len(), "All header packets read");
            self.headers_read = true;
        }
    }

    /// Remember how many header packets came from the BOS page
    pub(crate) fn mark_bos_headers(&mut self) {
        self.headers_on_bos = self.headers.len();
    }

    /// Prepare for re-reading the file from the start
    pub(crate) fn rewind(&mut self) {
        self.assembler.reset();
        self.headers_skipped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ogg::page::{Framing, Page};
    use crate::testutil::build_page;

    pub(super) fn page(bytes: Vec<u8>) -> Page {
        match Page::frame(&bytes) {
            Framing::Page(page, _) => page,
            other => panic!("bad test page: {:?}", other),
        }
    }

    fn demuxer(codec: CodecKind, first: &[u8]) -> Demuxer {
        let mut d = Demuxer::new(1, 0, codec, PacketAssembler::new(1));
        d.in_use = true;
        d.add_header(first.to_vec());
        d
    }

    #[test]
    fn test_header_counts() {
        assert_eq!(demuxer(CodecKind::Vorbis, b"\x01vorbis").num_header_packets(), 3);
        assert_eq!(demuxer(CodecKind::Mp3, b"\x01").num_header_packets(), 2);
        let avc = demuxer(CodecKind::AvcVideo, b"\x01");
        assert_eq!((avc.num_header_packets(), avc.num_non_header_packets()), (2, 3));
    }

    #[test]
    fn test_vorbis_headers_complete_after_three() {
        let mut d = demuxer(CodecKind::Vorbis, b"\x01vorbis");
        assert_eq!(d.state(), StreamState::CollectingHeaders);

        let p = page(build_page(1, 1, 0, 0, &[b"\x03vorbis".to_vec(), b"\x05vorbis".to_vec()]));
        d.assembler.page_in(&p);
        d.process_header_page();
        assert!(d.headers_read);
        assert_eq!(d.headers().len(), 3);
        assert_eq!(d.state(), StreamState::SteadyState);
    }

    #[test]
    fn test_missing_headers_force_read() {
        let mut d = demuxer(CodecKind::Vorbis, b"\x01vorbis");
        let p = page(build_page(1, 1, 0, 0, &[b"\x03vorbis".to_vec(), b"\x00audio".to_vec()]));
        d.assembler.page_in(&p);
        d.process_header_page();
        assert!(d.headers_read);
        assert!(d.is_abandoned());
        assert_eq!(d.headers().len(), 2);
        assert_eq!(d.state(), StreamState::Abandoned);
    }

    #[test]
    fn test_default_predicate_stops_at_count() {
        let mut d = demuxer(CodecKind::Pcm, b"\x01header");
        assert!(d.is_header_packet(b"\x03comment"));
        d.add_header(b"\x03comment".to_vec());
        // Count reached: further tagged packets are data
        assert!(!d.is_header_packet(b"\x01late"));
        assert!(!d.is_header_packet(b""));
    }

    #[test]
    fn test_theora_and_kate_predicates() {
        let theora = demuxer(CodecKind::Theora, b"\x80theora");
        assert!(theora.is_header_packet(&[0x81]));
        assert!(theora.is_header_packet(&[0x82]));
        assert!(!theora.is_header_packet(&[0x83]));
        assert!(!theora.is_header_packet(&[0x40]));

        let kate = demuxer(CodecKind::Kate, b"\x80kate\0\0\0");
        assert!(kate.is_header_packet(&[0x8F]));
        assert!(!kate.is_header_packet(&[0x00]));
    }

    #[test]
    fn test_avc_collects_non_header_prefix() {
        let mut d = demuxer(CodecKind::AvcVideo, b"\x01header");
        let p = page(build_page(
            1,
            1,
            0,
            0,
            &[b"\x03comment".to_vec(), b"\x08a".to_vec(), b"\x00b".to_vec()],
        ));
        d.assembler.page_in(&p);
        d.process_header_page();
        assert!(!d.headers_read);
        assert_eq!(d.non_header_packets().len(), 2);

        let p = page(build_page(1, 2, 3, 0, &[b"\x00c".to_vec()]));
        d.assembler.page_in(&p);
        d.process_header_page();
        assert!(d.headers_read);
        assert!(!d.is_abandoned());
        assert_eq!(d.non_header_packets().len(), 3);
    }

    #[test]
    fn test_flac_headers_until_last_block() {
        use crate::codec::flac::{build_stream_info_block, FLAC_SIGNATURE};

        let mut d = demuxer(CodecKind::Flac, FLAC_SIGNATURE);
        assert_eq!(d.num_header_packets(), 2);

        let p = page(build_page(
            1,
            1,
            0,
            0,
            &[build_stream_info_block(false, 44100, 2, 16), vec![0x84, 0, 0, 0]],
        ));
        d.assembler.page_in(&p);
        d.process_header_page();
        assert!(d.headers_read);
        assert_eq!(d.headers().len(), 3);
        assert_eq!(d.flac().and_then(|f| f.stream_info.as_ref()).map(|i| i.channels), Some(2));
    }
}
