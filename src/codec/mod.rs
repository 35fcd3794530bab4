// Codec identification for Ogg logical streams
//
// A stream's codec is decided once, from the first packet of its BOS page.

pub mod aac;
pub mod avc;
pub mod flac;
pub mod fourcc;
pub mod kate;
pub mod theora;
pub mod xiph;

use crate::oggds::{StreamHeader, PACKET_TYPE_BITS, PACKET_TYPE_HEADER, STREAM_HEADER_SIZE};
use serde::Serialize;

pub const VORBIS_MAGIC: &[u8; 6] = b"vorbis";
pub const THEORA_MAGIC: &[u8; 6] = b"theora";
pub const KATE_MAGIC: &[u8; 7] = b"kate\0\0\0";

/// Audio codec ids carried in the OggDS subtype
pub const AUDIO_ID_PCM: u32 = 0x0001;
pub const AUDIO_ID_MP2: u32 = 0x0050;
pub const AUDIO_ID_MP3: u32 = 0x0055;
pub const AUDIO_ID_AC3: u32 = 0x2000;
pub const AUDIO_ID_AAC: u32 = 0x00ff;

/// Codec of a logical stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecKind {
    Vorbis,
    Theora,
    Kate,
    Flac,
    /// OggDS audio, codec id 0x0001
    Pcm,
    /// OggDS audio, codec id 0x0050 or 0x0055
    Mp3,
    /// OggDS audio, codec id 0x2000
    Ac3,
    /// OggDS audio, codec id 0x00ff
    Aac,
    /// OggDS text subtitles
    Text,
    /// OggDS video carrying h.264 in a VfW style wrapper
    AvcVideo,
    /// OggDS video with any other fourcc
    MsCompVideo { fourcc: String },
    Unknown,
}

/// Coarse track type used for identification and track selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitles,
    Unknown,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Subtitles => "subtitles",
            TrackKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CodecKind {
    pub fn track_kind(&self) -> TrackKind {
        match self {
            CodecKind::Vorbis
            | CodecKind::Flac
            | CodecKind::Pcm
            | CodecKind::Mp3
            | CodecKind::Ac3
            | CodecKind::Aac => TrackKind::Audio,
            CodecKind::Theora | CodecKind::AvcVideo | CodecKind::MsCompVideo { .. } => TrackKind::Video,
            CodecKind::Kate | CodecKind::Text => TrackKind::Subtitles,
            CodecKind::Unknown => TrackKind::Unknown,
        }
    }

    /// Codec name as shown in identification output
    pub fn codec_name(&self) -> &str {
        match self {
            CodecKind::Vorbis => "Vorbis",
            CodecKind::Theora => "Theora",
            CodecKind::Kate => "Kate",
            CodecKind::Flac => "FLAC",
            CodecKind::Pcm => "PCM",
            CodecKind::Mp3 => "MP2/MP3",
            CodecKind::Ac3 => "AC3",
            CodecKind::Aac => "AAC",
            CodecKind::Text => "Text",
            CodecKind::AvcVideo => "h.264/AVC",
            CodecKind::MsCompVideo { fourcc } => fourcc,
            CodecKind::Unknown => "unknown",
        }
    }

    /// Streams that start with an OggDS stream header
    pub fn is_oggds(&self) -> bool {
        matches!(
            self,
            CodecKind::Pcm
                | CodecKind::Mp3
                | CodecKind::Ac3
                | CodecKind::Aac
                | CodecKind::Text
                | CodecKind::AvcVideo
                | CodecKind::MsCompVideo { .. }
        )
    }
}

impl std::fmt::Display for CodecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.codec_name())
    }
}

/// Classify a stream from its first packet.
///
/// `stream_id` only appears in the warning for unsupported audio codec ids.
pub fn sniff(packet: &[u8], allow_avc_in_vfw_mode: bool, stream_id: usize) -> CodecKind {
    if packet.len() >= 7 && &packet[1..7] == VORBIS_MAGIC {
        return CodecKind::Vorbis;
    }
    if packet.len() >= 7 && &packet[1..7] == THEORA_MAGIC {
        return CodecKind::Theora;
    }
    if packet.len() >= 8 && &packet[1..8] == KATE_MAGIC {
        return CodecKind::Kate;
    }
    if packet.len() >= 4 && &packet[0..4] == flac::FLAC_SIGNATURE {
        return CodecKind::Flac;
    }

    if packet.len() >= 1 + STREAM_HEADER_SIZE && packet[0] & PACKET_TYPE_BITS == PACKET_TYPE_HEADER {
        if let Some(header) = StreamHeader::parse(packet) {
            return sniff_oggds(&header, allow_avc_in_vfw_mode, stream_id);
        }
    }

    // Old style OggDS headers are not supported
    CodecKind::Unknown
}

fn sniff_oggds(header: &StreamHeader, allow_avc_in_vfw_mode: bool, stream_id: usize) -> CodecKind {
    if header.streamtype.starts_with(b"video") {
        if fourcc::is_avc_fourcc(&header.subtype) && !allow_avc_in_vfw_mode {
            CodecKind::AvcVideo
        } else {
            CodecKind::MsCompVideo {
                fourcc: header.fourcc(),
            }
        }
    } else if header.streamtype.starts_with(b"audio") {
        let codec_id = header.audio_codec_id();
        match codec_id {
            AUDIO_ID_PCM => CodecKind::Pcm,
            AUDIO_ID_MP2 | AUDIO_ID_MP3 => CodecKind::Mp3,
            AUDIO_ID_AC3 => CodecKind::Ac3,
            AUDIO_ID_AAC => CodecKind::Aac,
            _ => {
                tracing::warn!(
                    "Unknown audio stream type 0x{:04x}. Stream ID {} will be ignored.",
                    codec_id,
                    stream_id
                );
                CodecKind::Unknown
            }
        }
    } else if header.streamtype.starts_with(b"text") {
        CodecKind::Text
    } else {
        CodecKind::Unknown
    }
}
