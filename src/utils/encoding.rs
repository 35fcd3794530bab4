// Charset conversion for comment text (titles, chapter lines)

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Converts comment bytes to UTF-8.
///
/// Ogg comments are supposed to be UTF-8, but OGM muxers wrote whatever the
/// local charset was. With an explicit charset everything goes through it;
/// without one, valid UTF-8 is kept and anything else is read as
/// Windows-1252.
#[derive(Debug, Clone, Copy)]
pub struct CharsetConverter {
    encoding: Option<&'static Encoding>,
}

impl CharsetConverter {
    /// Build a converter from a charset label such as `"ISO-8859-1"` or
    /// `"cp1251"`. Unknown labels fall back to the default behaviour.
    pub fn new(label: Option<&str>) -> Self {
        let encoding = label.and_then(|l| Encoding::for_label(l.trim().as_bytes()));
        if label.is_some() && encoding.is_none() {
            tracing::warn!(charset = label.unwrap_or_default(), "Unknown charset, assuming UTF-8");
        }
        CharsetConverter { encoding }
    }

    /// Whether the caller named a charset explicitly
    pub fn is_explicit(&self) -> bool {
        self.encoding.is_some()
    }

    pub fn utf8(&self, data: &[u8]) -> String {
        match self.encoding {
            Some(encoding) => encoding.decode(data).0.into_owned(),
            None => match std::str::from_utf8(data) {
                Ok(text) => text.to_string(),
                Err(_) => WINDOWS_1252.decode(data).0.into_owned(),
            },
        }
    }
}

impl Default for CharsetConverter {
    fn default() -> Self {
        CharsetConverter::new(None)
    }
}

/// Encode text as UTF-8 with a leading byte-order mark
pub fn utf8_with_bom(text: &str) -> Vec<u8> {
    let mut out = vec![0xEF, 0xBB, 0xBF];
    out.extend_from_slice(UTF_8.encode(text).0.as_ref());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keeps_utf8() {
        let conv = CharsetConverter::default();
        assert_eq!(conv.utf8("Grüße".as_bytes()), "Grüße");
        assert!(!conv.is_explicit());
    }

    #[test]
    fn test_default_falls_back_to_windows_1252() {
        let conv = CharsetConverter::default();
        assert_eq!(conv.utf8(&[b'G', 0xFC, b'r']), "Gür");
    }

    #[test]
    fn test_explicit_charset() {
        let conv = CharsetConverter::new(Some("windows-1251"));
        assert!(conv.is_explicit());
        assert_eq!(conv.utf8(&[0xC0]), "А");
    }

    #[test]
    fn test_bom() {
        assert_eq!(utf8_with_bom("a"), vec![0xEF, 0xBB, 0xBF, b'a']);
    }
}
