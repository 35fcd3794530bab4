// CLI binary entry point for ogmdemux
//
// Identifies Ogg/OGM files and lists the packets the demultiplexer extracts.

mod cli;

use clap::Parser;
use cli::commands::{command_chapters, command_identify, command_packets, command_probe};
use cli::{Commands, Config, OutputFormatter};
use std::process;

fn main() {
    let config = Config::parse();

    // Logs go to stderr so they never mix with JSON output
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_filter().to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let formatter = OutputFormatter::new(config.format, config.quiet);
    if let Err(e) = run(&config, &formatter) {
        formatter.print_error(&format!("{:#}", e));
        process::exit(1);
    }
}

fn run(config: &Config, formatter: &OutputFormatter) -> anyhow::Result<()> {
    let options = config.reader_options()?;

    match &config.command {
        Commands::Identify { files } => command_identify(files, &options, formatter),
        Commands::Probe { files } => command_probe(files, formatter),
        Commands::Packets {
            file,
            tracks,
            limit,
            payload,
        } => command_packets(file, tracks, *limit, *payload, options, formatter),
        Commands::Chapters { file } => command_chapters(file, &options, formatter),
    }
}
