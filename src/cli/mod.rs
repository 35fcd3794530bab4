// CLI module for ogmdemux
//
// Only compiled into the binary. Library errors are wrapped with anyhow here.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config};
pub use output::OutputFormatter;
