// Stream comments: language, title and chapters
//
// The second header packet of Vorbis, Theora, Kate and OggDS streams is a
// Vorbis comment packet. OGM writers put the track language, the track title
// and the file's chapters there.

use crate::chapters::{ChapterParser, TextDocument};
use crate::codec::CodecKind;
use crate::demux::Demuxer;
use crate::iso639::map_to_iso639_2_code;
use crate::options::ReaderOptions;
use crate::session::SessionContext;
use crate::utils::encoding::{utf8_with_bom, CharsetConverter};
use crate::utils::io::read_le_u32;
use std::io::{self, Cursor, Read};

/// Packet type byte plus the "vorbis" magic (or the OggDS equivalent)
const COMMENT_PACKET_PREFIX: u64 = 7;

fn read_comment_list<R: Read>(reader: &mut R, comments: &mut Vec<Vec<u8>>) -> io::Result<()> {
    // Vendor string
    let vendor_length = read_le_u32(reader)? as u64;
    io::copy(&mut reader.by_ref().take(vendor_length), &mut io::sink())?;

    let count = read_le_u32(reader)?;
    for _ in 0..count {
        // The declared length is untrusted: read only what the packet holds
        let length = read_le_u32(reader)? as u64;
        let mut comment = Vec::new();
        reader.by_ref().take(length).read_to_end(&mut comment)?;
        if (comment.len() as u64) < length {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "comment runs past the packet end"));
        }
        comments.push(comment);
    }
    Ok(())
}

/// Raw `KEY=value` entries of a comment packet.
///
/// A truncated packet yields the entries read before the truncation.
pub fn extract_vorbis_comments(packet: &[u8]) -> Vec<Vec<u8>> {
    let mut comments = Vec::new();
    let mut cursor = Cursor::new(packet);
    cursor.set_position(COMMENT_PACKET_PREFIX);

    if let Err(e) = read_comment_list(&mut cursor, &mut comments) {
        tracing::debug!(read = comments.len(), "Comment packet truncated: {}", e);
    }
    comments
}

/// Remove `[...]` and `(...)` groups; an unterminated group runs to the end.
fn strip_bracketed(value: &str) -> String {
    let mut text = value.to_string();
    for (open, close) in [('[', ']'), ('(', ')')] {
        while let Some(start) = text.find(open) {
            let end = text[start..].find(close).map_or(text.len(), |p| start + p + 1);
            text.replace_range(start..end, "");
        }
    }
    text
}

/// Map a LANGUAGE comment to an ISO 639-2 code
pub fn parse_language(value: &str) -> Option<&'static str> {
    map_to_iso639_2_code(value).or_else(|| map_to_iso639_2_code(&strip_bracketed(value)))
}

/// Apply the comments of every stream to the streams and the session.
pub fn handle_stream_comments(
    demuxers: &mut [Demuxer],
    options: &ReaderOptions,
    session: &mut SessionContext,
    parser: &dyn ChapterParser,
    file_name: &str,
) {
    let converter = CharsetConverter::new(options.chapter_charset.as_deref());
    let mut charset_warning_printed = false;

    for demuxer in demuxers.iter_mut() {
        if demuxer.codec == CodecKind::Flac || demuxer.headers().len() < 2 {
            continue;
        }

        let comments = extract_vorbis_comments(&demuxer.headers()[1]);
        if comments.is_empty() {
            continue;
        }

        let mut title = None;
        let mut chapter_lines: Vec<&[u8]> = Vec::new();

        for (index, raw) in comments.iter().enumerate() {
            let Some(split) = raw.iter().position(|&b| b == b'=') else {
                continue;
            };
            let (key, value) = (&raw[..split], &raw[split + 1..]);
            tracing::debug!(
                track = demuxer.track_id,
                index,
                "Comment: {}",
                String::from_utf8_lossy(raw)
            );

            if key.eq_ignore_ascii_case(b"LANGUAGE") {
                if let Some(code) = parse_language(&String::from_utf8_lossy(value)) {
                    demuxer.language = Some(code.to_string());
                }
            } else if key.eq_ignore_ascii_case(b"TITLE") {
                title = Some(value);
            } else if key.starts_with(b"CHAPTER") {
                chapter_lines.push(raw);
            }
        }

        let mut segment_title_set = false;
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            let title = converter.utf8(title);
            if matches!(demuxer.codec, CodecKind::MsCompVideo { .. }) {
                segment_title_set = session.set_segment_title(title.clone());
            }
            demuxer.title = Some(title);
        }

        let mut chapters_set = false;
        if !chapter_lines.is_empty() && !options.no_chapters && !session.has_chapters() {
            let text: String = chapter_lines
                .iter()
                .map(|line| converter.utf8(line) + "\n")
                .collect();
            let document = TextDocument::new(file_name, utf8_with_bom(&text));

            match parser.parse(&document) {
                Ok(chapters) => {
                    tracing::debug!(track = demuxer.track_id, count = chapters.len(), "Chapters found");
                    chapters_set = session.set_chapters(chapters);
                }
                Err(e) => tracing::debug!(track = demuxer.track_id, "Chapters ignored: {}", e),
            }
        }

        if (segment_title_set || chapters_set) && !charset_warning_printed && !converter.is_explicit() {
            tracing::warn!(
                "This Ogg/OGM file contains chapter or title information. Unfortunately the charset used to store \
                 this information in the file cannot be identified unambiguously. The program assumes that your \
                 system's current charset is appropriate. This can be overridden with the '--chapter-charset \
                 <charset>' switch."
            );
            charset_warning_printed = true;
        }
    }
}
