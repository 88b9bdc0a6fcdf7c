//! Per-icon output records and a JSON / JSONL writer for them.

use serde::Serialize;
use std::io::{self, Write};

use crate::element::IconElement;
use crate::types::{BatchReport, IconStatus};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// The state of one icon after a batch, as written to output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconRecord {
    pub id: String,
    pub tag: String,
    /// "labeled", "skipped" or "failed"
    pub status: &'static str,
    /// Accessibility label now on the icon (new or pre-existing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// `"<kind>: <message>"` for failed icons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IconRecord {
    /// Pair each icon with its outcome from `report`.
    ///
    /// `icons` must be the slice the report was produced from.
    pub fn collect(icons: &[IconElement], report: &BatchReport) -> Vec<Self> {
        icons
            .iter()
            .zip(&report.outcomes)
            .map(|(icon, outcome)| {
                let (status, error) = match &outcome.status {
                    IconStatus::Labeled(_) => ("labeled", None),
                    IconStatus::Skipped => ("skipped", None),
                    IconStatus::Failed { kind, message } => {
                        ("failed", Some(format!("{kind}: {message}")))
                    }
                };
                Self {
                    id: icon.id.clone(),
                    tag: icon.tag().to_string(),
                    status,
                    aria_label: icon.aria_label().map(str::to_string),
                    diagnostic: icon.diagnostic().map(str::to_string),
                    error,
                }
            })
            .collect()
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer. `pretty` only affects JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write one object, on its own line for JSONL.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write a batch: a JSON array, or one line per item for JSONL.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.items_written += items.len();
            }
            OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    pub fn items_written(&self) -> usize {
        self.items_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
