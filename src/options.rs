// Reader options
//
// Options can be loaded from a JSON file and are overridden by command line
// flags. Missing fields take their defaults.

use crate::codec::TrackKind;
use crate::error::{OgmError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Queued packet bytes above which `read` stops pulling input
pub const DEFAULT_MAX_QUEUED_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    pub max_queued_bytes: u64,
    /// Charset of titles and chapters stored in comments
    pub chapter_charset: Option<String>,
    pub no_chapters: bool,
    pub tracks: TrackSelection,
    /// Treat AVC fourccs as plain VfW video
    pub allow_avc_in_vfw_mode: bool,
    /// NALU size length written into the avcC record
    pub nalu_size_length: Option<u8>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            max_queued_bytes: DEFAULT_MAX_QUEUED_BYTES,
            chapter_charset: None,
            no_chapters: false,
            tracks: TrackSelection::default(),
            allow_avc_in_vfw_mode: false,
            nalu_size_length: None,
        }
    }
}

impl ReaderOptions {
    /// Load options from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let options: ReaderOptions = serde_json::from_str(text).map_err(|e| OgmError::Options(e.to_string()))?;
        if let Some(length) = options.nalu_size_length {
            if !(1..=4).contains(&length) {
                return Err(OgmError::Options(format!(
                    "nalu_size_length must be between 1 and 4, got {}",
                    length
                )));
            }
        }
        Ok(options)
    }
}

/// Which tracks of one kind to demux
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackFilter {
    #[default]
    All,
    None,
    Only(Vec<usize>),
}

impl TrackFilter {
    pub fn allows(&self, track_id: usize) -> bool {
        match self {
            TrackFilter::All => true,
            TrackFilter::None => false,
            TrackFilter::Only(ids) => ids.contains(&track_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSelection {
    pub video: TrackFilter,
    pub audio: TrackFilter,
    pub subtitles: TrackFilter,
}

impl TrackSelection {
    /// Whether the track with this kind and id should be demuxed
    pub fn demuxing_requested(&self, kind: TrackKind, track_id: usize) -> bool {
        match kind {
            TrackKind::Video => self.video.allows(track_id),
            TrackKind::Audio => self.audio.allows(track_id),
            TrackKind::Subtitles => self.subtitles.allows(track_id),
            TrackKind::Unknown => false,
        }
    }

    /// Restrict every kind to the given track ids
    pub fn only(ids: &[usize]) -> Self {
        TrackSelection {
            video: TrackFilter::Only(ids.to_vec()),
            audio: TrackFilter::Only(ids.to_vec()),
            subtitles: TrackFilter::Only(ids.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReaderOptions::default();
        assert_eq!(options.max_queued_bytes, 20 * 1024 * 1024);
        assert!(!options.no_chapters);
        assert!(options.tracks.demuxing_requested(TrackKind::Audio, 5));
        assert!(!options.tracks.demuxing_requested(TrackKind::Unknown, 0));
    }

    #[test]
    fn test_from_json_partial() {
        let options = ReaderOptions::from_json(
            r#"{"chapter_charset": "ISO-8859-1", "tracks": {"audio": "none", "video": {"only": [0, 2]}}}"#,
        )
        .unwrap();
        assert_eq!(options.chapter_charset.as_deref(), Some("ISO-8859-1"));
        assert_eq!(options.max_queued_bytes, DEFAULT_MAX_QUEUED_BYTES);
        assert!(!options.tracks.demuxing_requested(TrackKind::Audio, 1));
        assert!(options.tracks.demuxing_requested(TrackKind::Video, 2));
        assert!(!options.tracks.demuxing_requested(TrackKind::Video, 1));
        assert!(options.tracks.demuxing_requested(TrackKind::Subtitles, 1));
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(ReaderOptions::from_json("{not json"), Err(OgmError::Options(_))));
        assert!(matches!(
            ReaderOptions::from_json(r#"{"nalu_size_length": 3}"#),
            Ok(ReaderOptions { nalu_size_length: Some(3), .. })
        ));
        assert!(ReaderOptions::from_json(r#"{"nalu_size_length": 9}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"no_chapters": true}"#).unwrap();
        let options = ReaderOptions::from_file(&path).unwrap();
        assert!(options.no_chapters);
    }
}
