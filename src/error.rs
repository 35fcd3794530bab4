// Error types for the Ogg/OGM demultiplexer

/// Errors that abort processing of a file.
///
/// Everything that only affects one stream or one page is logged and
/// recovered from instead of being reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum OgmError {
    /// IO error from the byte source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The source does not start with the Ogg capture pattern
    #[error("Source is not a valid Ogg media file")]
    NotOgg,

    /// Input ended before every stream in use delivered its headers
    #[error("Could not read all header packets")]
    HeadersIncomplete,

    /// A codec identification header could not be parsed
    #[error("Track {track}: the {codec} identification header could not be parsed ({reason})")]
    HeaderParse {
        track: usize,
        codec: &'static str,
        reason: String,
    },

    /// Header data is present but cannot be turned into a codec configuration
    #[error("Track {track}: {reason}")]
    CodecConfig { track: usize, reason: String },

    /// Options file could not be parsed
    #[error("Invalid options: {0}")]
    Options(String),
}

pub type Result<T> = std::result::Result<T, OgmError>;
