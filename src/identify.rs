// File identification
//
// Summarises the streams found during the header pass, either as a
// serialisable structure or in mkvmerge's one-line-per-track text form.

use crate::codec::{CodecKind, TrackKind};
use crate::demux::{Demuxer, StreamState};
use crate::reader::{OgmReader, StreamRegistry};
use crate::utils::io::ByteSource;
use serde::Serialize;

pub const CONTAINER_NAME: &str = "Ogg/OGM";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackInfo {
    pub id: usize,
    pub kind: TrackKind,
    pub codec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_dimensions: Option<String>,
    pub in_use: bool,
    pub state: StreamState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    pub container: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub tracks: Vec<TrackInfo>,
}

fn is_mscomp(demuxer: &Demuxer) -> bool {
    matches!(demuxer.codec, CodecKind::MsCompVideo { .. })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

impl TrackInfo {
    pub fn from_demuxer(demuxer: &Demuxer) -> Self {
        let display_dimensions = (demuxer.display_width != 0 && demuxer.display_height != 0)
            .then(|| format!("{}x{}", demuxer.display_width, demuxer.display_height));

        TrackInfo {
            id: demuxer.track_id,
            kind: demuxer.codec.track_kind(),
            codec: demuxer.codec.codec_name().to_string(),
            language: non_empty(&demuxer.language),
            // The title of OGM video tracks names the whole file
            track_name: if is_mscomp(demuxer) { None } else { non_empty(&demuxer.title) },
            display_dimensions,
            in_use: demuxer.in_use,
            state: demuxer.state(),
        }
    }

    /// Attribute list in `key:value` form, values escaped
    pub fn attributes(&self) -> Vec<String> {
        let mut attributes = Vec::new();
        if let Some(language) = &self.language {
            attributes.push(format!("language:{}", escape(language)));
        }
        if let Some(name) = &self.track_name {
            attributes.push(format!("track_name:{}", escape(name)));
        }
        if let Some(dimensions) = &self.display_dimensions {
            attributes.push(format!("display_dimensions:{}", dimensions));
        }
        attributes
    }
}

impl Identification {
    pub fn from_streams(streams: &StreamRegistry) -> Self {
        let title = streams
            .iter()
            .filter(|d| is_mscomp(d))
            .find_map(|d| non_empty(&d.title));

        Identification {
            container: CONTAINER_NAME,
            title,
            tracks: streams.iter().map(TrackInfo::from_demuxer).collect(),
        }
    }

    /// mkvmerge style identification text
    pub fn to_text(&self, file_name: &str) -> String {
        let mut out = format!("File '{}': container: {}", file_name, self.container);
        if let Some(title) = &self.title {
            out.push_str(&format!(" [title:{}]", escape(title)));
        }
        out.push('\n');

        for track in &self.tracks {
            out.push_str(&format!("Track ID {}: {} ({})", track.id, track.kind, track.codec));
            let attributes = track.attributes();
            if !attributes.is_empty() {
                out.push_str(&format!(" [{}]", attributes.join(" ")));
            }
            out.push('\n');
        }
        out
    }
}

impl<S: ByteSource> OgmReader<S> {
    pub fn identify(&self) -> Identification {
        Identification::from_streams(self.streams())
    }
}

/// Escape a value for the identification text
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' => out.push_str("\\s"),
            '"' => out.push_str("\\2"),
            ':' => out.push_str("\\c"),
            '#' => out.push_str("\\h"),
            _ => out.push(c),
        }
    }
    out
}
