// Values shared by all readers of one muxing session
//
// Every field can be set once; later attempts leave the first value in place.

use crate::chapters::Chapter;

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    segment_title: Option<String>,
    chapters: Option<Vec<Chapter>>,
    video_fps: Option<f64>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the title was stored
    pub fn set_segment_title(&mut self, title: impl Into<String>) -> bool {
        if self.segment_title.is_some() {
            return false;
        }
        self.segment_title = Some(title.into());
        true
    }

    pub fn segment_title(&self) -> Option<&str> {
        self.segment_title.as_deref()
    }

    /// Returns true if the chapters were stored
    pub fn set_chapters(&mut self, chapters: Vec<Chapter>) -> bool {
        if self.chapters.is_some() {
            return false;
        }
        self.chapters = Some(chapters);
        true
    }

    pub fn chapters(&self) -> Option<&[Chapter]> {
        self.chapters.as_deref()
    }

    pub fn has_chapters(&self) -> bool {
        self.chapters.is_some()
    }

    /// Returns true if the frame rate was stored
    pub fn set_video_fps(&mut self, fps: f64) -> bool {
        if self.video_fps.is_some() {
            return false;
        }
        self.video_fps = Some(fps);
        true
    }

    pub fn video_fps(&self) -> Option<f64> {
        self.video_fps
    }
}
