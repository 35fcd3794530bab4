// Output formatting for CLI

use crate::cli::config::OutputFormat;
use anyhow::Result;
use ogmdemux::Identification;
use serde::Serialize;
use std::io::{self, Write};

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Output the identification of one file
    pub fn output_identification(&self, file_name: &str, id: &Identification, writer: &mut impl Write) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => write!(writer, "{}", id.to_text(file_name))?,
            OutputFormat::Json => {
                let value = serde_json::json!({ "file": file_name, "identification": id });
                writeln!(writer, "{}", serde_json::to_string(&value)?)?;
            }
            OutputFormat::KeyValue | OutputFormat::Table => {
                let mut header = serde_json::json!({ "file": file_name, "container": id.container });
                if let Some(title) = &id.title {
                    header["title"] = title.clone().into();
                }
                self.output_record(&header, writer)?;
                for track in &id.tracks {
                    self.output_record(track, writer)?;
                }
            }
        }
        Ok(())
    }

    /// Output any serialisable record
    pub fn output_record(&self, record: &impl Serialize, writer: &mut impl Write) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.output_value(&value, writer)
    }

    /// Output a JSON value
    pub fn output_value(&self, value: &serde_json::Value, writer: &mut impl Write) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => writeln!(writer, "{}", serde_json::to_string_pretty(value)?)?,
            OutputFormat::Json => writeln!(writer, "{}", serde_json::to_string(value)?)?,
            OutputFormat::KeyValue => self.output_key_value(value, writer)?,
            OutputFormat::Table => self.output_table(value, writer)?,
        }
        Ok(())
    }

    /// Output as key-value pairs
    fn output_key_value(&self, value: &serde_json::Value, writer: &mut impl Write) -> io::Result<()> {
        if let Some(obj) = value.as_object() {
            let mut items: Vec<_> = obj.iter().collect();
            items.sort_by(|a, b| a.0.cmp(b.0));

            for (key, value) in items {
                writeln!(writer, "{}: {}", key, format_value(value))?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Output as table
    fn output_table(&self, value: &serde_json::Value, writer: &mut impl Write) -> io::Result<()> {
        if let Some(obj) = value.as_object() {
            let max_key_len = obj.keys().map(|k| k.len()).max().unwrap_or(0);

            writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
            for (key, value) in obj {
                writeln!(
                    writer,
                    "{:<width$}: {}",
                    format!("{}:", key),
                    format_value(value),
                    width = max_key_len + 2
                )?;
            }
            writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        }
        Ok(())
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            eprintln!("  {}", message);
        }
    }
}

/// Format a JSON value for display
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "(null)".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Array(arr) => {
            if arr.is_empty() {
                "[]".to_string()
            } else {
                format!("[{} items]", arr.len())
            }
        }
        serde_json::Value::Object(obj) => {
            if obj.is_empty() {
                "{}".to_string()
            } else {
                format!("{{{} items}}", obj.len())
            }
        }
    }
}

/// Read progress of a demux run, printed to stderr
pub struct ProgressBar {
    last: Option<u32>,
    show: bool,
    prefix: String,
}

impl ProgressBar {
    pub fn new(show: bool, prefix: impl Into<String>) -> Self {
        Self {
            last: None,
            show,
            prefix: prefix.into(),
        }
    }

    pub fn update(&mut self, percent: u32) {
        if !self.show || self.last == Some(percent) {
            return;
        }
        self.last = Some(percent);
        eprint!("\r{} ({}%)", self.prefix, percent);
        io::stderr().flush().ok();
    }

    pub fn finish(&mut self) {
        if self.show && self.last.is_some() {
            eprintln!();
        }
    }
}
