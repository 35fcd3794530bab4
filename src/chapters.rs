// Chapters stored as OGM style comments
//
//   CHAPTER01=00:00:00.000
//   CHAPTER01NAME=Opening
//
// Comment extraction writes these lines into an in-memory text document and
// hands it to a `ChapterParser`.

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

/// In-memory text file, optionally starting with a byte order mark
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    name: String,
    data: Vec<u8>,
}

impl TextDocument {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        TextDocument { name: name.into(), data }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn has_bom(&self) -> bool {
        self.data.starts_with(UTF8_BOM)
    }

    /// Text content without the byte order mark
    pub fn text(&self) -> String {
        let body = self.data.strip_prefix(UTF8_BOM.as_slice()).unwrap_or(&self.data);
        String::from_utf8_lossy(body).to_string()
    }
}

/// One chapter entry. Times are in nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub start: i64,
    pub name: String,
}

impl Chapter {
    pub fn new(start: i64, name: impl Into<String>) -> Self {
        Chapter {
            start,
            name: name.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChapterError {
    #[error("the document contains no chapters")]
    Empty,

    #[error("line {line}: not a chapter entry: {content}")]
    InvalidLine { line: usize, content: String },

    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: usize, value: String },

    #[error("line {line}: name for chapter {number} without a start time")]
    OrphanName { line: usize, number: String },
}

/// Parses structured text into chapters
pub trait ChapterParser {
    fn parse(&self, document: &TextDocument) -> Result<Vec<Chapter>, ChapterError>;
}

/// Parser for `CHAPTERxx=` / `CHAPTERxxNAME=` pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleChapterParser;

impl SimpleChapterParser {
    pub fn new() -> Self {
        SimpleChapterParser
    }
}

/// Parse `HH:MM:SS[.fff]` into nanoseconds
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M:%S%.f").ok()?;
    Some(time.num_seconds_from_midnight() as i64 * 1_000_000_000 + time.nanosecond() as i64)
}

/// Format nanoseconds as `HH:MM:SS.fffffffff`
pub fn format_timestamp(ns: i64) -> String {
    let ns = ns.max(0);
    let secs = ns / 1_000_000_000;
    let nanos = (ns % 1_000_000_000) as u32;
    match NaiveTime::from_num_seconds_from_midnight_opt(secs as u32, nanos).filter(|_| secs < 86_400) {
        Some(time) => time.format("%H:%M:%S%.9f").to_string(),
        None => format!("{:02}:{:02}:{:02}.{:09}", secs / 3600, secs / 60 % 60, secs % 60, nanos),
    }
}

impl ChapterParser for SimpleChapterParser {
    fn parse(&self, document: &TextDocument) -> Result<Vec<Chapter>, ChapterError> {
        let text = document.text();
        let mut chapters: Vec<(String, Chapter)> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let invalid = || ChapterError::InvalidLine {
                line: line_no,
                content: line.to_string(),
            };
            let (key, value) = line.split_once('=').ok_or_else(invalid)?;
            let number = key
                .strip_prefix("CHAPTER")
                .filter(|rest| !rest.is_empty())
                .ok_or_else(invalid)?;

            if let Some(number) = number.strip_suffix("NAME") {
                match chapters.iter_mut().rev().find(|(n, _)| n == number) {
                    Some((_, chapter)) => chapter.name = value.to_string(),
                    None => {
                        return Err(ChapterError::OrphanName {
                            line: line_no,
                            number: number.to_string(),
                        })
                    }
                }
            } else if number.bytes().all(|b| b.is_ascii_digit()) {
                let start = parse_timestamp(value).ok_or_else(|| ChapterError::InvalidTimestamp {
                    line: line_no,
                    value: value.to_string(),
                })?;
                chapters.push((number.to_string(), Chapter::new(start, "")));
            } else {
                return Err(invalid());
            }
        }

        if chapters.is_empty() {
            return Err(ChapterError::Empty);
        }
        Ok(chapters.into_iter().map(|(_, chapter)| chapter).collect())
    }
}
