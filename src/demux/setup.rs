// Codec initialisation and packetizer configuration

use super::{CodecState, Demuxer};
use crate::codec::aac::AudioSpecificConfig;
use crate::codec::fourcc::is_mpeg4_p2_fourcc;
use crate::codec::kate::KateIdentification;
use crate::codec::theora::TheoraIdentification;
use crate::codec::{avc, xiph, CodecKind};
use crate::error::{OgmError, Result};
use crate::oggds::{StreamHeader, STREAM_HEADER_SIZE};
use crate::options::ReaderOptions;
use crate::packet::{AudioParams, PacketizerSetup, VideoParams};
use crate::session::SessionContext;
use crate::utils::io::le_u32_at;

/// Size of the BITMAPINFOHEADER handed to VfW style video packetizers
const BITMAPINFOHEADER_SIZE: u32 = 40;

/// AudioSpecificConfig offset within the first header packet
const AAC_CONFIG_OFFSET: usize = 1 + STREAM_HEADER_SIZE + 4;

fn bitmap_info_header(width: u32, height: u32, compression: &[u8; 4]) -> Vec<u8> {
    let mut bih = Vec::with_capacity(BITMAPINFOHEADER_SIZE as usize);
    bih.extend_from_slice(&BITMAPINFOHEADER_SIZE.to_le_bytes());
    bih.extend_from_slice(&width.to_le_bytes());
    bih.extend_from_slice(&height.to_le_bytes());
    bih.extend_from_slice(&1u16.to_le_bytes()); // planes
    bih.extend_from_slice(&24u16.to_le_bytes()); // bit count
    bih.extend_from_slice(compression);
    bih.extend_from_slice(&width.wrapping_mul(height).wrapping_mul(3).to_le_bytes());
    bih.resize(BITMAPINFOHEADER_SIZE as usize, 0);
    bih
}

impl Demuxer {
    /// Parse codec headers once the first header packet is stored.
    pub fn initialize(&mut self, session: &mut SessionContext) -> Result<()> {
        let Some(first) = self.headers.first() else {
            return Ok(());
        };

        match &self.codec {
            CodecKind::Theora => {
                let header = TheoraIdentification::parse(first).map_err(|reason| OgmError::HeaderParse {
                    track: self.track_id,
                    codec: "Theora",
                    reason,
                })?;
                self.display_width = header.display_width;
                self.display_height = header.display_height;
                self.state = CodecState::Theora(header);
            }
            CodecKind::Kate => {
                let header = KateIdentification::parse(first).map_err(|reason| OgmError::HeaderParse {
                    track: self.track_id,
                    codec: "Kate",
                    reason,
                })?;
                self.num_header_packets = header.nheaders as usize;
                self.state = CodecState::Kate(header);
            }
            CodecKind::MsCompVideo { .. } => {
                let header = self.parse_stream_header()?;
                self.init_video_timing(&header, session);
                self.state = CodecState::MsComp {
                    header,
                    frames_since_granulepos_change: 0,
                };
            }
            CodecKind::AvcVideo => {
                let header = self.parse_stream_header()?;
                self.init_video_timing(&header, session);
                self.state = CodecState::OggDs(header);
            }
            CodecKind::Pcm | CodecKind::Mp3 | CodecKind::Ac3 | CodecKind::Aac | CodecKind::Text => {
                self.state = CodecState::OggDs(self.parse_stream_header()?);
            }
            CodecKind::Vorbis | CodecKind::Flac | CodecKind::Unknown => {}
        }

        Ok(())
    }

    fn parse_stream_header(&self) -> Result<StreamHeader> {
        self.headers
            .first()
            .and_then(|packet| StreamHeader::parse(packet))
            .ok_or_else(|| OgmError::CodecConfig {
                track: self.track_id,
                reason: "OggDS stream header too short".to_string(),
            })
    }

    fn init_video_timing(&mut self, header: &StreamHeader, session: &mut SessionContext) {
        self.default_duration = (header.time_unit as i64).wrapping_mul(100);
        if let Some(fps) = header.fps() {
            session.set_video_fps(fps);
        }
    }

    /// Build the packetizer configuration for this stream.
    pub fn create_packetizer(&self, options: &ReaderOptions) -> Result<PacketizerSetup> {
        let module = self.module_name();
        let mut setup = PacketizerSetup::new(self.track_id, self.codec.clone(), module);
        setup.language = self.language.clone();
        setup.track_name = self.title.clone();

        match &self.codec {
            CodecKind::Vorbis => {
                let id = self.headers.first().map(Vec::as_slice).unwrap_or_default();
                setup.codec_private = Some(xiph::lace(&self.headers));
                setup.audio = Some(AudioParams {
                    sample_rate: le_u32_at(id, 12).unwrap_or(0),
                    channels: id.get(11).copied().unwrap_or(0) as u16,
                    bits_per_sample: 0,
                });
            }
            CodecKind::Theora => {
                let header = self.theora().ok_or_else(|| self.missing_header("Theora"))?;
                setup.codec_private = Some(xiph::lace(&self.headers));
                setup.video = Some(VideoParams {
                    width: header.fmbw,
                    height: header.fmbh,
                    fps: Some(header.fps()),
                });
            }
            CodecKind::Kate => {
                setup.codec_private = Some(xiph::lace(&self.headers));
            }
            CodecKind::Flac => {
                setup.codec_private = Some(self.headers.concat());
                if let Some(info) = self.flac().and_then(|f| f.stream_info.as_ref()) {
                    setup.audio = Some(AudioParams {
                        sample_rate: info.sample_rate,
                        channels: info.channels as u16,
                        bits_per_sample: info.bits_per_sample as u16,
                    });
                }
            }
            CodecKind::Pcm | CodecKind::Mp3 | CodecKind::Ac3 => {
                let header = self.require_stream_header()?;
                setup.audio = Some(AudioParams {
                    sample_rate: header.samples_per_unit as u32,
                    channels: header.audio_channels(),
                    bits_per_sample: if self.codec == CodecKind::Pcm { header.bits_per_sample } else { 0 },
                });
            }
            CodecKind::Aac => self.configure_aac(&mut setup)?,
            CodecKind::Text => {}
            CodecKind::AvcVideo => {
                let header = self.require_stream_header()?;
                let private = self.headers[0].get(1 + STREAM_HEADER_SIZE..).unwrap_or_default();
                let avcc = avc::extract_avcc(private, &self.nh_packets, options.nalu_size_length).ok_or_else(|| {
                    OgmError::CodecConfig {
                        track: self.track_id,
                        reason: "Could not extract the decoder specific config data (AVCC) from this AVC/h.264 track."
                            .to_string(),
                    }
                })?;
                setup.codec_private = Some(avcc);
                setup.video = Some(VideoParams {
                    width: header.video_width(),
                    height: header.video_height(),
                    fps: header.fps(),
                });
                setup.timecode_generation = false;
                setup.default_duration = Some(self.default_duration);
            }
            CodecKind::MsCompVideo { .. } => {
                let header = self.require_stream_header()?;
                let (width, height) = (header.video_width(), header.video_height());
                setup.codec_private = Some(bitmap_info_header(width, height, &header.subtype));
                setup.video = Some(VideoParams {
                    width,
                    height,
                    fps: header.fps(),
                });
                // The segment title carries the name of OGM video tracks
                setup.track_name = None;
            }
            CodecKind::Unknown => {
                return Err(OgmError::CodecConfig {
                    track: self.track_id,
                    reason: "unknown stream type".to_string(),
                })
            }
        }

        Ok(setup)
    }

    fn configure_aac(&self, setup: &mut PacketizerSetup) -> Result<()> {
        let header = self.require_stream_header()?;
        let config = self.headers[0]
            .get(AAC_CONFIG_OFFSET..)
            .and_then(|data| AudioSpecificConfig::parse(data).ok());

        match config {
            Some(config) => {
                tracing::debug!(
                    track = self.track_id,
                    object_type = config.object_type,
                    channels = config.channels,
                    sample_rate = config.sample_rate,
                    sbr = config.sbr,
                    output_sample_rate = config.output_sample_rate,
                    "AAC decoder config"
                );
                setup.audio = Some(AudioParams {
                    sample_rate: config.sample_rate,
                    channels: config.channels as u16,
                    bits_per_sample: 0,
                });
                if config.sbr {
                    setup.output_sampling_freq = Some(config.output_sample_rate);
                }
            }
            None => {
                setup.audio = Some(AudioParams {
                    sample_rate: header.samples_per_unit as u32,
                    channels: header.audio_channels(),
                    bits_per_sample: 0,
                });
            }
        }
        Ok(())
    }

    fn require_stream_header(&self) -> Result<&StreamHeader> {
        self.stream_header().ok_or_else(|| OgmError::CodecConfig {
            track: self.track_id,
            reason: "OggDS stream header too short".to_string(),
        })
    }

    fn missing_header(&self, codec: &'static str) -> OgmError {
        OgmError::HeaderParse {
            track: self.track_id,
            codec,
            reason: "identification header was not parsed".to_string(),
        }
    }

    /// Output module name logged when the packetizer is created
    pub fn module_name(&self) -> &'static str {
        match &self.codec {
            CodecKind::Vorbis => "Vorbis",
            CodecKind::Theora => "Theora video",
            CodecKind::Kate => "Kate subtitle",
            CodecKind::Flac => "FLAC",
            CodecKind::Pcm => "PCM",
            CodecKind::Mp3 => "MPEG audio",
            CodecKind::Ac3 => "AC3",
            CodecKind::Aac => "AAC",
            CodecKind::Text => "text subtitle",
            CodecKind::AvcVideo => "MPEG-4 part 10 ES video",
            CodecKind::MsCompVideo { fourcc } => {
                let mut bytes = [0u8; 4];
                for (dst, src) in bytes.iter_mut().zip(fourcc.bytes()) {
                    *dst = src;
                }
                if is_mpeg4_p2_fourcc(&bytes) {
                    "MPEG-4 part 2 video"
                } else {
                    "video"
                }
            }
            CodecKind::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::avc::{TEST_PPS, TEST_SPS};
    use crate::ogg::PacketAssembler;
    use crate::testutil::oggds_header;

    fn demuxer(codec: CodecKind, headers: Vec<Vec<u8>>) -> Demuxer {
        let mut d = Demuxer::new(1, 3, codec, PacketAssembler::new(1));
        d.in_use = true;
        for header in headers {
            d.add_header(header);
        }
        d
    }

    fn video_specific(width: u32, height: u32) -> [u8; 8] {
        let mut sh = [0u8; 8];
        sh[0..4].copy_from_slice(&width.to_le_bytes());
        sh[4..8].copy_from_slice(&height.to_le_bytes());
        sh
    }

    #[test]
    fn test_mscomp_setup() {
        let header = oggds_header("video", b"XVID", 400_000, 1, video_specific(640, 480));
        let mut d = demuxer(CodecKind::MsCompVideo { fourcc: "XVID".into() }, vec![header]);
        d.title = Some("Movie".into());
        let mut session = SessionContext::new();
        d.initialize(&mut session).unwrap();

        assert_eq!(d.default_duration, 40_000_000);
        assert_eq!(session.video_fps(), Some(25.0));

        let setup = d.create_packetizer(&ReaderOptions::default()).unwrap();
        assert_eq!(setup.module, "MPEG-4 part 2 video");
        assert_eq!(setup.track_name, None);
        let bih = setup.codec_private.unwrap();
        assert_eq!(bih.len(), 40);
        assert_eq!(&bih[16..20], b"XVID");
        assert_eq!(le_u32_at(&bih, 4), Some(640));
        assert_eq!(le_u32_at(&bih, 20), Some(640 * 480 * 3));
        assert_eq!(setup.video.unwrap().fps, Some(25.0));
    }

    #[test]
    fn test_huge_time_unit_does_not_overflow() {
        let header = oggds_header("video", b"XVID", u64::MAX / 2, 1, video_specific(640, 480));
        let mut d = demuxer(CodecKind::MsCompVideo { fourcc: "XVID".into() }, vec![header]);
        d.initialize(&mut SessionContext::new()).unwrap();
        assert_eq!(d.default_duration, ((u64::MAX / 2) as i64).wrapping_mul(100));
    }

    #[test]
    fn test_generic_video_module() {
        let header = oggds_header("video", b"MJPG", 400_000, 1, video_specific(320, 240));
        let mut d = demuxer(CodecKind::MsCompVideo { fourcc: "MJPG".into() }, vec![header]);
        d.initialize(&mut SessionContext::new()).unwrap();
        assert_eq!(d.module_name(), "video");
    }

    #[test]
    fn test_short_oggds_header_is_fatal() {
        let mut d = demuxer(CodecKind::Mp3, vec![vec![0x01, b'a', b'u']]);
        assert!(matches!(
            d.initialize(&mut SessionContext::new()),
            Err(OgmError::CodecConfig { track: 3, .. })
        ));
    }

    #[test]
    fn test_theora_parse_failure() {
        let mut d = demuxer(CodecKind::Theora, vec![b"\x80theora\x03".to_vec()]);
        assert!(matches!(
            d.initialize(&mut SessionContext::new()),
            Err(OgmError::HeaderParse { codec: "Theora", .. })
        ));
    }

    #[test]
    fn test_theora_setup() {
        use crate::codec::theora::build_identification;
        let mut d = demuxer(
            CodecKind::Theora,
            vec![build_identification(20, 15, 30, 1, 1, 1), vec![0x81, 1], vec![0x82, 2]],
        );
        d.initialize(&mut SessionContext::new()).unwrap();
        assert_eq!((d.display_width, d.display_height), (320, 240));

        let setup = d.create_packetizer(&ReaderOptions::default()).unwrap();
        assert_eq!(setup.module, "Theora video");
        assert_eq!(setup.codec_private.unwrap()[0], 2);
        let video = setup.video.unwrap();
        assert_eq!((video.width, video.height), (320, 240));
        assert_eq!(video.fps, Some(30.0));
    }

    #[test]
    fn test_kate_header_count() {
        use crate::codec::kate::build_identification;
        let mut d = demuxer(CodecKind::Kate, vec![build_identification(9, "en")]);
        d.initialize(&mut SessionContext::new()).unwrap();
        assert_eq!(d.num_header_packets(), 9);
        assert_eq!(d.kate().map(|k| k.language.as_str()), Some("en"));
    }

    #[test]
    fn test_vorbis_setup() {
        let mut id = b"\x01vorbis".to_vec();
        id.extend_from_slice(&0u32.to_le_bytes());
        id.push(2);
        id.extend_from_slice(&48000u32.to_le_bytes());
        let d = demuxer(CodecKind::Vorbis, vec![id, b"\x03vorbis".to_vec(), b"\x05vorbis".to_vec()]);

        let setup = d.create_packetizer(&ReaderOptions::default()).unwrap();
        assert_eq!(setup.module, "Vorbis");
        let audio = setup.audio.unwrap();
        assert_eq!((audio.sample_rate, audio.channels), (48000, 2));
    }

    #[test]
    fn test_avc_setup() {
        let mut header = oggds_header("video", b"H264", 400_000, 1, video_specific(1280, 720));
        header.extend_from_slice(&[0, 0, 0, 1]);
        header.extend_from_slice(&TEST_SPS);

        let mut d = demuxer(CodecKind::AvcVideo, vec![header, b"\x03comment".to_vec()]);
        let mut pps = vec![0, 0, 0, 1];
        pps.extend_from_slice(&TEST_PPS);
        d.nh_packets = vec![Vec::new(), pps, vec![0x00, 0x01]];
        d.initialize(&mut SessionContext::new()).unwrap();

        let setup = d.create_packetizer(&ReaderOptions::default()).unwrap();
        assert_eq!(setup.module, "MPEG-4 part 10 ES video");
        assert!(!setup.timecode_generation);
        assert_eq!(setup.default_duration, Some(40_000_000));
        let avcc = setup.codec_private.unwrap();
        assert_eq!(avcc[0], 1);
        assert_eq!(avcc[4], 0xFF);
    }

    #[test]
    fn test_avc_without_parameter_sets_fails() {
        let header = oggds_header("video", b"H264", 400_000, 1, video_specific(1280, 720));
        let mut d = demuxer(CodecKind::AvcVideo, vec![header, b"\x03comment".to_vec()]);
        d.nh_packets = vec![vec![0x00, 1], vec![0x00, 2], vec![0x00, 3]];
        d.initialize(&mut SessionContext::new()).unwrap();

        let err = d.create_packetizer(&ReaderOptions::default()).unwrap_err();
        assert!(err.to_string().contains("AVCC"));
    }

    #[test]
    fn test_aac_sbr_output_frequency() {
        let mut header = oggds_header("audio", b"00ff", 10_000_000, 24000, [2, 0, 0, 0, 0, 0, 0, 0]);
        header.extend_from_slice(&[0; 4]);
        header.extend_from_slice(&[0x2B, 0x11, 0x88, 0x00]);
        let mut d = demuxer(CodecKind::Aac, vec![header]);
        d.initialize(&mut SessionContext::new()).unwrap();

        let setup = d.create_packetizer(&ReaderOptions::default()).unwrap();
        assert_eq!(setup.output_sampling_freq, Some(48000));
        assert_eq!(setup.audio.unwrap().sample_rate, 24000);
    }

    #[test]
    fn test_aac_without_config_uses_stream_header() {
        let header = oggds_header("audio", b"00ff", 10_000_000, 44100, [2, 0, 0, 0, 0, 0, 0, 0]);
        let mut d = demuxer(CodecKind::Aac, vec![header]);
        d.initialize(&mut SessionContext::new()).unwrap();

        let setup = d.create_packetizer(&ReaderOptions::default()).unwrap();
        assert_eq!(setup.output_sampling_freq, None);
        let audio = setup.audio.unwrap();
        assert_eq!((audio.sample_rate, audio.channels), (44100, 2));
    }
}
