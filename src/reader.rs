// Ogg/OGM reader
//
// Drives the page reader, routes pages to per-stream demuxers and owns the
// packetizers. Reading happens in two passes over the file:
//
//   1. the header pass collects the header packets of every stream, then
//      rewinds the source;
//   2. `read()` is called repeatedly and hands one page at a time to the
//      stream it belongs to.

use crate::chapters::{ChapterParser, SimpleChapterParser};
use crate::codec::{self, CodecKind};
use crate::comments::handle_stream_comments;
use crate::demux::Demuxer;
use crate::error::{OgmError, Result};
use crate::ogg::{Page, PacketAssembler, PageReader, OGG_SIGNATURE};
use crate::options::ReaderOptions;
use crate::packet::{PacketizerFactory, PacketizerRegistry};
use crate::session::SessionContext;
use crate::utils::io::{ByteSource, FileSource, SeekOrigin};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Result of looking up a serial number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(usize),
    /// The stream exists but was not selected
    NotInUse(usize),
    NotFound,
}

/// All logical streams of a file, in order of appearance.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    demuxers: Vec<Demuxer>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_stream(&self, serial: u32) -> Lookup {
        match self.demuxers.iter().position(|d| d.serial == serial) {
            Some(index) if self.demuxers[index].in_use => Lookup::Found(index),
            Some(index) => Lookup::NotInUse(index),
            None => Lookup::NotFound,
        }
    }

    /// Add a stream; returns its index, which is also its track id
    pub fn register_stream(&mut self, demuxer: Demuxer) -> usize {
        self.demuxers.push(demuxer);
        self.demuxers.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Demuxer> {
        self.demuxers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Demuxer> {
        self.demuxers.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Demuxer> {
        self.demuxers.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Demuxer> {
        self.demuxers.iter_mut()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Demuxer] {
        &mut self.demuxers
    }

    pub fn len(&self) -> usize {
        self.demuxers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demuxers.is_empty()
    }
}

/// Outcome of one [`OgmReader::read`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    MoreData,
    /// Too much data is queued; call again once packets were consumed
    Holding,
    Done,
}

/// Check for the Ogg capture pattern at the start of `source`.
///
/// The read position is left at the beginning.
pub fn probe<S: ByteSource + ?Sized>(source: &mut S) -> io::Result<bool> {
    if source.size() < OGG_SIGNATURE.len() as u64 {
        return Ok(false);
    }

    source.set_file_pointer(0, SeekOrigin::Beginning)?;
    let mut magic = [0u8; 4];
    let read = source.read(&mut magic)?;
    source.set_file_pointer(0, SeekOrigin::Beginning)?;

    Ok(read == magic.len() && &magic == OGG_SIGNATURE)
}

pub struct OgmReader<S: ByteSource> {
    source: S,
    options: ReaderOptions,
    page_reader: PageReader,
    streams: StreamRegistry,
    packetizers: PacketizerRegistry,
}

impl OgmReader<FileSource<BufReader<File>>> {
    /// Open and read the headers of a file on disk
    pub fn open<P: AsRef<Path>>(path: P, options: ReaderOptions, session: &mut SessionContext) -> Result<Self> {
        let source = FileSource::open(path)?;
        Self::new(source, options, session)
    }
}

impl<S: ByteSource> OgmReader<S> {
    /// Read all stream headers and comments of `source`.
    pub fn new(source: S, options: ReaderOptions, session: &mut SessionContext) -> Result<Self> {
        Self::with_chapter_parser(source, options, session, &SimpleChapterParser)
    }

    pub fn with_chapter_parser(
        mut source: S,
        options: ReaderOptions,
        session: &mut SessionContext,
        chapter_parser: &dyn ChapterParser,
    ) -> Result<Self> {
        if !probe(&mut source)? {
            return Err(OgmError::NotOgg);
        }

        let mut reader = OgmReader {
            source,
            options,
            page_reader: PageReader::new(),
            streams: StreamRegistry::new(),
            packetizers: PacketizerRegistry::new(),
        };
        reader.read_headers(session)?;

        let file_name = reader.source.name().to_string();
        handle_stream_comments(
            reader.streams.as_mut_slice(),
            &reader.options,
            session,
            chapter_parser,
            &file_name,
        );

        tracing::info!(source = %file_name, streams = reader.streams.len(), "Using the OGG/OGM demultiplexer.");
        Ok(reader)
    }

    fn read_headers(&mut self, session: &mut SessionContext) -> Result<()> {
        loop {
            let Some(page) = self.page_reader.read_page(&mut self.source)? else {
                if self.streams.iter().any(|d| d.in_use && !d.headers_read) {
                    return Err(OgmError::HeadersIncomplete);
                }
                break;
            };

            // All beginning of stream pages come first
            if page.is_bos() {
                self.handle_new_stream(&page, session)?;
                continue;
            }

            if let Lookup::Found(index) = self.streams.find_stream(page.serial()) {
                if let Some(demuxer) = self.streams.get_mut(index).filter(|d| !d.headers_read) {
                    demuxer.assembler.page_in(&page);
                    demuxer.process_header_page();
                }
            }

            if self.streams.iter().all(|d| d.headers_read || !d.in_use) {
                break;
            }
        }

        self.source.set_file_pointer(0, SeekOrigin::Beginning)?;
        self.page_reader.reset();
        for demuxer in self.streams.iter_mut() {
            demuxer.rewind();
        }
        Ok(())
    }

    fn handle_new_stream(&mut self, page: &Page, session: &mut SessionContext) -> Result<()> {
        let serial = page.serial();
        if self.streams.find_stream(serial) != Lookup::NotFound {
            tracing::warn!(serial, "Second beginning of stream page for the same serial number, ignoring it");
            return Ok(());
        }

        let mut assembler = PacketAssembler::new(serial);
        assembler.page_in(page);
        let Some(first) = assembler.packet_out() else {
            tracing::warn!(serial, "Beginning of stream page without a complete packet, ignoring the stream");
            return Ok(());
        };

        let track_id = self.streams.len();
        let codec = codec::sniff(&first.data, self.options.allow_avc_in_vfw_mode, track_id);
        let mut demuxer = Demuxer::new(serial, track_id, codec, assembler);
        demuxer.in_use = demuxer.codec != CodecKind::Unknown
            && self
                .options
                .tracks
                .demuxing_requested(demuxer.codec.track_kind(), track_id);
        demuxer.eos |= first.eos;
        demuxer.add_header(first.data);

        tracing::debug!(
            track = track_id,
            serial,
            codec = %demuxer.codec,
            in_use = demuxer.in_use,
            "New stream"
        );

        if let Err(e) = demuxer.initialize(session) {
            if demuxer.in_use {
                return Err(e);
            }
            tracing::warn!(track = track_id, "{}", e);
        }

        if demuxer.in_use && !demuxer.headers_read {
            demuxer.process_header_page();
        }
        demuxer.mark_bos_headers();

        self.streams.register_stream(demuxer);
        Ok(())
    }

    /// Create a packetizer for every selected stream.
    pub fn create_packetizers(&mut self, factory: &mut dyn PacketizerFactory) -> Result<()> {
        for demuxer in self.streams.iter_mut().filter(|d| d.in_use && d.packetizer.is_none()) {
            let setup = match demuxer.create_packetizer(&self.options) {
                Ok(setup) => setup,
                Err(e) if demuxer.is_abandoned() => {
                    tracing::warn!(track = demuxer.track_id, "No output for broken stream: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut packetizer = factory.create(&setup);
            if !setup.timecode_generation {
                packetizer.enable_timecode_generation(false);
            }
            if let Some(duration) = setup.default_duration {
                packetizer.set_track_default_duration(duration);
            }
            if let Some(freq) = setup.output_sampling_freq {
                packetizer.set_audio_output_sampling_freq(freq);
            }

            tracing::info!(track = demuxer.track_id, "Using the {} output module.", setup.module);
            demuxer.packetizer = Some(self.packetizers.add(packetizer));
        }
        Ok(())
    }

    /// Process the next data page.
    pub fn read(&mut self) -> Result<FileStatus> {
        // Some tracks contain huge gaps; don't pull in the whole file
        if self.packetizers.queued_bytes() > self.options.max_queued_bytes {
            return Ok(FileStatus::Holding);
        }

        loop {
            let Some(page) = self.page_reader.read_page(&mut self.source)? else {
                self.flush_packetizers();
                return Ok(FileStatus::Done);
            };
            if !page.is_bos() {
                self.process_page(&page);
                break;
            }
        }

        if self.streams.iter().any(|d| d.in_use && !d.eos) {
            return Ok(FileStatus::MoreData);
        }
        self.flush_packetizers();
        Ok(FileStatus::Done)
    }

    /// Hand one page to its stream
    pub fn process_page(&mut self, page: &Page) {
        let Lookup::Found(index) = self.streams.find_stream(page.serial()) else {
            return;
        };
        let Some(demuxer) = self.streams.get_mut(index) else {
            return;
        };

        let granulepos = page.granule_position();
        if granulepos != -1 && granulepos < demuxer.last_granulepos {
            tracing::warn!(
                track = demuxer.track_id,
                granulepos,
                last_granulepos = demuxer.last_granulepos,
                "The timecodes for this stream have been reset in the middle of the file. This is not supported. \
                 The current packet will be discarded."
            );
            return;
        }

        demuxer.assembler.page_in(page);
        demuxer.process_page(granulepos, &mut self.packetizers);
        demuxer.last_granulepos = granulepos;
    }

    /// Every packetizer has at least one packet ready
    pub fn packet_available(&self) -> bool {
        if self.streams.is_empty() {
            return false;
        }
        self.streams
            .iter()
            .filter_map(|d| d.packetizer)
            .all(|id| self.packetizers.get(id).is_some_and(|p| p.packet_available()))
    }

    /// Read position in percent of the file size
    pub fn progress(&mut self) -> Result<u32> {
        let size = self.source.size();
        if size == 0 {
            return Ok(100);
        }
        let position = self.source.file_pointer()?;
        Ok((position.saturating_mul(100) / size) as u32)
    }

    pub fn available_track_ids(&self) -> Vec<usize> {
        (0..self.streams.len()).collect()
    }

    pub fn flush_packetizers(&mut self) {
        self.packetizers.flush_all();
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    pub fn packetizers(&self) -> &PacketizerRegistry {
        &self.packetizers
    }

    pub fn packetizers_mut(&mut self) -> &mut PacketizerRegistry {
        &mut self.packetizers
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}
