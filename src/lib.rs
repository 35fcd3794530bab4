//! ogmdemux - Ogg/OGM demultiplexer
//!
//! Reads Ogg files carrying Vorbis, Theora, Kate, FLAC and OggDS ("OGM")
//! streams, identifies every logical stream, collects its header packets
//! and hands timed packets to packetizers.
//!
//! ```no_run
//! use ogmdemux::{FileStatus, OgmReader, QueuedPacketizerFactory, ReaderOptions, SessionContext};
//!
//! # fn main() -> ogmdemux::Result<()> {
//! let mut session = SessionContext::new();
//! let mut reader = OgmReader::open("movie.ogm", ReaderOptions::default(), &mut session)?;
//! println!("{}", reader.identify().to_text("movie.ogm"));
//!
//! reader.create_packetizers(&mut QueuedPacketizerFactory::new())?;
//! while reader.read()? != FileStatus::Done {}
//! # Ok(())
//! # }
//! ```

pub mod chapters;
pub mod codec;
pub mod comments;
pub mod demux;
pub mod error;
pub mod identify;
pub mod iso639;
pub mod ogg;
pub mod oggds;
pub mod options;
pub mod packet;
pub mod reader;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testutil;

pub use chapters::{Chapter, ChapterParser, SimpleChapterParser, TextDocument};
pub use codec::{CodecKind, TrackKind};
pub use demux::{Demuxer, StreamState};
pub use error::{OgmError, Result};
pub use identify::{Identification, TrackInfo};
pub use options::{ReaderOptions, TrackFilter, TrackSelection};
pub use packet::{
    FrameType, MediaPacket, Packetizer, PacketizerFactory, PacketizerId, PacketizerSetup, QueuedPacketizer,
    QueuedPacketizerFactory,
};
pub use reader::{probe, FileStatus, OgmReader};
pub use session::SessionContext;
