// CLI command implementations
use crate::cli::output::{OutputFormatter, ProgressBar};
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ogmdemux::chapters::format_timestamp;
use ogmdemux::utils::io::FileSource;
use ogmdemux::{
    probe, FileStatus, FrameType, MediaPacket, OgmReader, Packetizer as _, QueuedPacketizerFactory, ReaderOptions,
    SessionContext, TrackSelection,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Expand glob patterns; plain paths are kept as given
pub fn expand_patterns(patterns: &[String], formatter: &OutputFormatter) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            files.push(pattern.clone());
            continue;
        }

        let entries = glob::glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => files.push(path.to_string_lossy().into_owned()),
                Ok(_) => {}
                Err(e) => formatter.print_error(&format!("Error reading path: {}", e)),
            }
        }
    }
    Ok(files)
}

/// Identify the tracks of each file
pub fn command_identify(files: &[String], options: &ReaderOptions, formatter: &OutputFormatter) -> Result<()> {
    let files = expand_patterns(files, formatter)?;
    if files.is_empty() {
        bail!("No files specified");
    }

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut error_count = 0;

    for file_path in &files {
        let mut session = SessionContext::new();
        match OgmReader::open(file_path, options.clone(), &mut session) {
            Ok(reader) => formatter.output_identification(file_path, &reader.identify(), &mut writer)?,
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file_path, e));
                error_count += 1;
            }
        }
    }

    if error_count > 0 {
        bail!("{} of {} files could not be identified", error_count, files.len());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ProbeRecord<'a> {
    file: &'a str,
    ogg: bool,
}

/// Report whether each file starts with an Ogg page
pub fn command_probe(files: &[String], formatter: &OutputFormatter) -> Result<()> {
    let files = expand_patterns(files, formatter)?;
    if files.is_empty() {
        bail!("No files specified");
    }

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    for file_path in &files {
        let result = FileSource::open(file_path).and_then(|mut source| probe(&mut source));
        match result {
            Ok(ogg) => formatter.output_record(&ProbeRecord { file: file_path, ogg }, &mut writer)?,
            Err(e) => formatter.print_error(&format!("{}: {}", file_path, e)),
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct PacketRecord {
    track: usize,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    timecode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ns: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_type: Option<FrameType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
}

impl PacketRecord {
    fn new(track: usize, packet: &MediaPacket, with_payload: bool) -> Self {
        PacketRecord {
            track,
            size: packet.data.len(),
            timecode: packet.timecode.map(format_timestamp),
            duration_ns: packet.duration,
            frame_type: packet.frame_type,
            payload: with_payload.then(|| STANDARD.encode(&packet.data)),
        }
    }
}

/// Demultiplex a file and print one record per packet
pub fn command_packets(
    file: &Path,
    tracks: &[usize],
    limit: Option<usize>,
    with_payload: bool,
    mut options: ReaderOptions,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !tracks.is_empty() {
        options.tracks = TrackSelection::only(tracks);
    }

    let mut session = SessionContext::new();
    let mut reader = OgmReader::open(file, options, &mut session)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let mut factory = QueuedPacketizerFactory::new();
    reader.create_packetizers(&mut factory)?;

    let outputs: Vec<_> = reader
        .streams()
        .iter()
        .filter_map(|d| d.packetizer.map(|id| (d.track_id, id)))
        .collect();
    if outputs.is_empty() {
        formatter.print_info("No tracks selected for demuxing");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut progress = ProgressBar::new(!formatter.is_quiet(), file.display().to_string());
    let mut count = 0;

    'demux: loop {
        let status = reader.read()?;

        for &(track, id) in &outputs {
            while let Some(packet) = reader.packetizers_mut().get_mut(id).and_then(|p| p.get_packet()) {
                formatter.output_record(&PacketRecord::new(track, &packet, with_payload), &mut writer)?;
                count += 1;
                if limit.is_some_and(|limit| count >= limit) {
                    break 'demux;
                }
            }
        }

        progress.update(reader.progress()?);
        if status == FileStatus::Done {
            break;
        }
    }

    progress.finish();
    writer.flush()?;
    formatter.print_info(&format!("{} packets", count));
    Ok(())
}

#[derive(Debug, Serialize)]
struct ChapterRecord<'a> {
    start: String,
    name: &'a str,
}

/// Print the chapters and the segment title found in the comments
pub fn command_chapters(file: &Path, options: &ReaderOptions, formatter: &OutputFormatter) -> Result<()> {
    let mut session = SessionContext::new();
    OgmReader::open(file, options.clone(), &mut session)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    if let Some(title) = session.segment_title() {
        formatter.print_info(&format!("Title: {}", title));
    }

    let Some(chapters) = session.chapters() else {
        formatter.print_info("No chapters found");
        return Ok(());
    };

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    for chapter in chapters {
        let record = ChapterRecord {
            start: format_timestamp(chapter.start),
            name: &chapter.name,
        };
        formatter.output_record(&record, &mut writer)?;
    }
    Ok(())
}
