// Steady-state packet handling
//
// Every page handed to a demuxer after the header phase ends up here. Each
// codec decides which packets to skip and how to time the rest.

use super::{CodecState, Demuxer};
use crate::codec::CodecKind;
use crate::ogg::Packet;
use crate::oggds;
use crate::packet::{FrameType, MediaPacket, Packetizer, PacketizerRegistry};

type Sink<'a> = Option<&'a mut (dyn Packetizer + 'static)>;

fn emit(sink: &mut Sink<'_>, packet: MediaPacket) {
    if let Some(packetizer) = sink.as_deref_mut() {
        packetizer.process(packet);
    }
}

/// Filler OGM writes instead of an empty subtitle
fn is_empty_subtitle(payload: &[u8]) -> bool {
    payload.len() <= 2
        && payload
            .first()
            .map_or(true, |&b| matches!(b, b' ' | 0 | b'\r' | b'\n'))
}

impl Demuxer {
    /// Hand all packets assembled from the latest page to the packetizer.
    ///
    /// Streams without a packetizer still consume their packets so that
    /// end-of-stream is tracked.
    pub fn process_page(&mut self, granulepos: i64, packetizers: &mut PacketizerRegistry) {
        let mut sink: Sink<'_> = match self.packetizer {
            Some(id) => packetizers.get_mut(id),
            None => None,
        };

        match self.codec {
            CodecKind::Vorbis => self.process_vorbis(&mut sink),
            CodecKind::Theora => self.process_theora(&mut sink),
            CodecKind::Kate => self.process_kate(&mut sink),
            CodecKind::Flac => self.process_flac(&mut sink),
            CodecKind::Text => self.process_text(granulepos, &mut sink),
            CodecKind::MsCompVideo { .. } => self.process_mscomp(granulepos, &mut sink),
            CodecKind::Pcm | CodecKind::Mp3 | CodecKind::Ac3 | CodecKind::Aac | CodecKind::AvcVideo => {
                self.process_oggds(&mut sink)
            }
            CodecKind::Unknown => {
                while let Some(packet) = self.next_packet() {
                    tracing::trace!(track = self.track_id, bytes = packet.data.len(), "Dropping packet of unknown stream");
                }
            }
        }
    }

    fn next_packet(&mut self) -> Option<Packet> {
        let packet = self.assembler.packet_out()?;
        self.eos |= packet.eos;
        Some(packet)
    }

    // OggDS audio and AVC video: strip the flag and duration bytes
    fn process_oggds(&mut self, sink: &mut Sink<'_>) {
        while let Some(packet) = self.next_packet() {
            if packet.data.is_empty() || oggds::is_header_or_comment(&packet.data) {
                continue;
            }

            let payload = oggds::payload(&packet.data).to_vec();
            self.units_processed += (packet.data.len() - 1) as u64;
            emit(sink, MediaPacket::untimed(payload));
        }
    }

    fn process_vorbis(&mut self, sink: &mut Sink<'_>) {
        while let Some(packet) = self.next_packet() {
            if packet.data.is_empty() || oggds::is_header_or_comment(&packet.data) {
                continue;
            }
            emit(sink, MediaPacket::untimed(packet.data));
        }
    }

    fn process_flac(&mut self, sink: &mut Sink<'_>) {
        let to_skip = self.headers.len().saturating_sub(self.headers_on_bos);
        while let Some(packet) = self.next_packet() {
            if self.headers_skipped < to_skip {
                self.headers_skipped += 1;
                continue;
            }
            emit(sink, MediaPacket::untimed(packet.data));
        }
    }

    fn process_theora(&mut self, sink: &mut Sink<'_>) {
        let (timing, kfgshift) = match &self.state {
            CodecState::Theora(header) => (Some(header.clone()), header.kfgshift),
            _ => (None, 0),
        };

        while let Some(packet) = self.next_packet() {
            let Some(&first) = packet.data.first() else {
                continue;
            };
            if first & 0x80 != 0 {
                continue;
            }

            let is_keyframe = first & 0x40 == 0;
            let frame_type = if is_keyframe { FrameType::Key } else { FrameType::Delta };
            let media = match &timing {
                Some(header) => MediaPacket::timed(
                    packet.data,
                    header.timecode(self.units_processed),
                    header.frame_duration(),
                ),
                None => MediaPacket::untimed(packet.data),
            };
            self.units_processed += 1;

            tracing::trace!(
                track = self.track_id,
                kfgshift,
                granulepos = packet.granule_position,
                key = is_keyframe,
                "Theora frame"
            );
            emit(sink, media.with_frame_type(frame_type));
        }
    }

    fn process_kate(&mut self, sink: &mut Sink<'_>) {
        while let Some(packet) = self.next_packet() {
            if packet.data.first().map_or(true, |b| b & 0x80 != 0) {
                continue;
            }

            let eos = packet.eos;
            emit(sink, MediaPacket::untimed(packet.data));
            self.units_processed += 1;

            if eos {
                self.eos = true;
                return;
            }
        }
    }

    fn process_text(&mut self, granulepos: i64, sink: &mut Sink<'_>) {
        self.units_processed += 1;

        while let Some(packet) = self.next_packet() {
            if packet.data.is_empty() || oggds::is_header_or_comment(&packet.data) {
                continue;
            }

            let (duration, _) = oggds::duration_and_len(&packet.data);
            let payload = oggds::payload(&packet.data);
            if is_empty_subtitle(payload) {
                continue;
            }

            emit(
                sink,
                MediaPacket::timed(
                    payload.to_vec(),
                    granulepos.wrapping_mul(1_000_000),
                    duration.wrapping_mul(1_000_000),
                ),
            );
        }
    }

    fn process_mscomp(&mut self, granulepos: i64, sink: &mut Sink<'_>) {
        struct Frame {
            data: Vec<u8>,
            duration: i64,
            flags: u8,
        }

        let mut frames = Vec::new();
        while let Some(packet) = self.next_packet() {
            if packet.data.is_empty() || oggds::is_header_or_comment(&packet.data) {
                continue;
            }

            let (mut duration, duration_len) = oggds::duration_and_len(&packet.data);
            if duration_len == 0 || duration == 0 {
                duration = 1;
            }
            frames.push(Frame {
                data: oggds::payload(&packet.data).to_vec(),
                duration: duration.wrapping_mul(self.default_duration),
                flags: packet.data[0],
            });
        }

        let CodecState::MsComp {
            frames_since_granulepos_change,
            ..
        } = &mut self.state
        else {
            return;
        };

        // Absorb gaps in the granulepos sequence. Timing values come straight
        // from the file and wrap instead of overflowing.
        let frame_count = frames.len() as i64;
        if granulepos.wrapping_sub(self.last_granulepos) > frame_count {
            self.last_granulepos = granulepos.wrapping_sub(frame_count);
        }

        for frame in frames {
            let timecode = self
                .last_granulepos
                .wrapping_add(*frames_since_granulepos_change)
                .wrapping_mul(self.default_duration);
            *frames_since_granulepos_change += 1;

            let frame_type = if frame.flags & oggds::PACKET_IS_SYNCPOINT != 0 {
                FrameType::Key
            } else {
                FrameType::Delta
            };
            if let Some(packetizer) = sink.as_deref_mut() {
                packetizer.process(MediaPacket::timed(frame.data, timecode, frame.duration).with_frame_type(frame_type));
            }
            self.units_processed += 1;
        }

        if granulepos != self.last_granulepos {
            *frames_since_granulepos_change = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::page;
    use super::*;
    use crate::codec::theora::build_identification;
    use crate::ogg::{PacketAssembler, OGG_HEADER_TYPE_EOS};
    use crate::packet::{PacketizerId, QueuedPacketizer};
    use crate::session::SessionContext;
    use crate::testutil::{build_page, oggds_header};

    fn ready(codec: CodecKind, headers: Vec<Vec<u8>>) -> (Demuxer, PacketizerRegistry) {
        let mut d = Demuxer::new(1, 0, codec, PacketAssembler::new(1));
        d.in_use = true;
        for header in headers {
            d.add_header(header);
        }
        d.mark_bos_headers();
        d.initialize(&mut SessionContext::new()).unwrap();
        d.headers_read = true;

        let mut registry = PacketizerRegistry::new();
        d.packetizer = Some(registry.add(Box::new(QueuedPacketizer::new())));
        (d, registry)
    }

    fn feed(d: &mut Demuxer, registry: &mut PacketizerRegistry, seq: u32, granule: i64, flags: u8, packets: &[Vec<u8>]) {
        let p = page(build_page(1, seq, granule, flags, packets));
        d.assembler.page_in(&p);
        d.process_page(granule, registry);
        d.last_granulepos = granule;
    }

    fn drain(registry: &mut PacketizerRegistry) -> Vec<MediaPacket> {
        let packetizer = registry.get_mut(PacketizerId(0)).unwrap();
        std::iter::from_fn(|| packetizer.get_packet()).collect()
    }

    #[test]
    fn test_vorbis_skips_headers() {
        let (mut d, mut registry) = ready(CodecKind::Vorbis, vec![b"\x01vorbis".to_vec()]);
        feed(
            &mut d,
            &mut registry,
            1,
            100,
            0,
            &[b"\x03vorbis".to_vec(), b"\x05vorbis".to_vec(), b"\x00abc".to_vec(), b"\x02def".to_vec()],
        );
        let packets = drain(&mut registry);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].data, b"\x00abc");
        assert_eq!(packets[0].timecode, None);
    }

    #[test]
    fn test_oggds_audio_strips_prefix() {
        let header = oggds_header("audio", b"0055", 10_000_000, 44100, [0; 8]);
        let (mut d, mut registry) = ready(CodecKind::Mp3, vec![header]);
        feed(
            &mut d,
            &mut registry,
            1,
            10,
            0,
            &[b"\x03comment".to_vec(), vec![0x40, 0x10, 0xAA, 0xBB], vec![0x00, 0xCC]],
        );
        let packets = drain(&mut registry);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].data, vec![0xAA, 0xBB]);
        assert_eq!(packets[1].data, vec![0xCC]);
        assert_eq!(d.units_processed, 3 + 1);
    }

    #[test]
    fn test_theora_timing_and_keyframes() {
        let (mut d, mut registry) = ready(CodecKind::Theora, vec![build_identification(40, 30, 25, 1, 1, 1)]);
        feed(
            &mut d,
            &mut registry,
            3,
            0,
            0,
            &[vec![0x82, 0], vec![0x00, 1], vec![0x40, 2], Vec::new(), vec![0x40, 3]],
        );
        let packets = drain(&mut registry);
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].timecode, Some(0));
        assert_eq!(packets[0].frame_type, Some(FrameType::Key));
        assert_eq!(packets[1].timecode, Some(40_000_000));
        assert_eq!(packets[1].frame_type, Some(FrameType::Delta));
        assert_eq!(packets[2].timecode, Some(80_000_000));
        assert_eq!(packets[2].duration, Some(40_000_000));
        assert_eq!(d.units_processed, 3);
    }

    #[test]
    fn test_text_suppresses_filler() {
        let header = oggds_header("text", b"\0\0\0\0", 10_000, 1, [0; 8]);
        let (mut d, mut registry) = ready(CodecKind::Text, vec![header]);
        feed(
            &mut d,
            &mut registry,
            1,
            1500,
            0,
            &[
                vec![0x40, 0xE8, b' '],
                vec![0x40, 0xE8, b'\r', b'\n'],
                vec![0x40, 0xE8, b'a', b'b', b'c'],
                vec![0x80, 0xD0, 0x07, b'H', b'i'],
                vec![0x00],
                vec![0x00, b'O', b'K', b'!'],
            ],
        );
        let packets = drain(&mut registry);
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].data, b"abc");
        assert_eq!(packets[0].timecode, Some(1_500_000_000));
        assert_eq!(packets[0].duration, Some(232_000_000));
        assert_eq!(packets[1].data, b"Hi");
        assert_eq!(packets[1].duration, Some(2_000_000_000));
        assert_eq!(packets[2].data, b"OK!");
        assert_eq!(packets[2].duration, Some(0));
        assert_eq!(d.units_processed, 1);
    }

    #[test]
    fn test_mscomp_gap_snap() {
        let header = oggds_header("video", b"XVID", 400_000, 1, [0; 8]);
        let (mut d, mut registry) = ready(
            CodecKind::MsCompVideo {
                fourcc: "XVID".to_string(),
            },
            vec![header],
        );
        assert_eq!(d.default_duration, 40_000_000);

        // Two frames ending at granulepos 2
        feed(&mut d, &mut registry, 2, 2, 0, &[vec![0x08, 1], vec![0x00, 2]]);
        // Jump to granulepos 10 with one frame: baseline snaps to 9
        feed(&mut d, &mut registry, 3, 10, 0, &[vec![0x48, 0x02, 3]]);

        let packets = drain(&mut registry);
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].timecode, Some(0));
        assert_eq!(packets[0].frame_type, Some(FrameType::Key));
        assert_eq!(packets[1].timecode, Some(40_000_000));
        assert_eq!(packets[1].frame_type, Some(FrameType::Delta));
        assert_eq!(packets[2].timecode, Some(9 * 40_000_000));
        assert_eq!(packets[2].duration, Some(80_000_000));
        assert_eq!(packets[2].data, vec![3]);
    }

    #[test]
    fn test_text_oversized_duration_wraps() {
        let header = oggds_header("text", b"\0\0\0\0", 10_000, 1, [0; 8]);
        let (mut d, mut registry) = ready(CodecKind::Text, vec![header]);
        let mut packet = vec![0xC2];
        packet.extend_from_slice(&[0xFF; 7]);
        packet.extend_from_slice(b"Hello");
        feed(&mut d, &mut registry, 1, i64::MAX, 0, &[packet]);

        let packets = drain(&mut registry);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].data, b"Hello");
        assert_eq!(packets[0].duration, Some(((1i64 << 56) - 1).wrapping_mul(1_000_000)));
        assert_eq!(packets[0].timecode, Some(i64::MAX.wrapping_mul(1_000_000)));
    }

    #[test]
    fn test_mscomp_extreme_timing_wraps() {
        let header = oggds_header("video", b"XVID", u64::MAX / 2, 1, [0; 8]);
        let (mut d, mut registry) = ready(
            CodecKind::MsCompVideo {
                fourcc: "XVID".to_string(),
            },
            vec![header],
        );
        let default_duration = d.default_duration;

        feed(&mut d, &mut registry, 2, i64::MAX, 0, &[vec![0x48, 0xFF, 1]]);
        feed(&mut d, &mut registry, 3, i64::MIN, 0, &[vec![0x08, 2]]);

        let packets = drain(&mut registry);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].timecode, Some((i64::MAX - 1).wrapping_mul(default_duration)));
        assert_eq!(packets[0].duration, Some(255i64.wrapping_mul(default_duration)));
        assert_eq!(packets[1].data, vec![2]);
    }

    #[test]
    fn test_kate_stops_at_eos() {
        use crate::codec::kate::build_identification;
        let (mut d, mut registry) = ready(CodecKind::Kate, vec![build_identification(1, "")]);
        feed(
            &mut d,
            &mut registry,
            1,
            5,
            OGG_HEADER_TYPE_EOS,
            &[vec![0x81], vec![0x00, 1], vec![0x7F, 2]],
        );
        let packets = drain(&mut registry);
        assert_eq!(packets.len(), 2);
        assert!(d.eos);
    }

    #[test]
    fn test_no_packetizer_still_tracks_eos() {
        let (mut d, mut registry) = ready(CodecKind::Vorbis, vec![b"\x01vorbis".to_vec()]);
        d.packetizer = None;
        feed(&mut d, &mut registry, 1, 5, OGG_HEADER_TYPE_EOS, &[b"\x00x".to_vec()]);
        assert!(d.eos);
        assert!(drain(&mut registry).is_empty());
    }

    #[test]
    fn test_empty_subtitle_rule() {
        assert!(is_empty_subtitle(b""));
        assert!(is_empty_subtitle(b" "));
        assert!(is_empty_subtitle(b"\0x"));
        assert!(!is_empty_subtitle(b"a"));
        assert!(!is_empty_subtitle(b"   "));
    }
}
