// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};
use ogmdemux::ReaderOptions;
use std::path::PathBuf;

/// ogmdemux - Ogg/OGM demultiplexer
#[derive(Parser, Debug)]
#[command(name = "ogmdemux")]
#[command(about = "Inspect and demultiplex Ogg/OGM media files", long_about = None)]
#[command(version)]
#[command(author = "xwsjjctz <xwsjjctz@icloud.com>")]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (only errors are logged)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Reader options as JSON
    #[arg(long, value_name = "FILE", global = true)]
    pub options: Option<PathBuf>,

    /// Charset of titles and chapters stored in the comments
    #[arg(long, value_name = "CHARSET", global = true)]
    pub chapter_charset: Option<String>,

    /// Ignore chapters found in the comments
    #[arg(long, global = true)]
    pub no_chapters: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Key-value pairs
    KeyValue,
    /// Table format
    Table,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Identify the tracks of Ogg/OGM file(s)
    Identify {
        /// File paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// Check whether file(s) are Ogg files
    Probe {
        /// File paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// Demultiplex a file and list its packets
    Packets {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only demux these track ids (repeatable)
        #[arg(short, long = "track")]
        tracks: Vec<usize>,

        /// Stop after this many packets
        #[arg(short, long)]
        limit: Option<usize>,

        /// Include packet payloads as base64
        #[arg(long)]
        payload: bool,
    },

    /// Show chapters stored in the stream comments
    Chapters {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Config {
    /// Reader options from `--options`, overridden by command line flags
    pub fn reader_options(&self) -> anyhow::Result<ReaderOptions> {
        let mut options = match &self.options {
            Some(path) => ReaderOptions::from_file(path)?,
            None => ReaderOptions::default(),
        };

        if let Some(charset) = &self.chapter_charset {
            options.chapter_charset = Some(charset.clone());
        }
        if self.no_chapters {
            options.no_chapters = true;
        }
        Ok(options)
    }

    /// Default log filter when RUST_LOG is not set
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "ogmdemux=debug"
        } else {
            "ogmdemux=info"
        }
    }
}
