use std::fs;
use std::path::Path;

use fusion_parser::{EnvelopeReader, LineError, RawUpdateEnvelope};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PipelineError, Result};

/// What to do with a line whose fixture header is incomplete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    #[default]
    Skip,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line_number: usize,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub input_hash: String,
    pub lines_read: usize,
    pub blank_lines: usize,
    pub prefiltered_lines: usize,
    pub parsed_lines: usize,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub envelopes: Vec<RawUpdateEnvelope>,
    pub summary: IngestSummary,
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Decodes every line of `content`, skipping the ones that cannot be used.
pub fn ingest(content: &[u8], policy: HeaderPolicy) -> Result<IngestOutcome> {
    let mut reader = EnvelopeReader::new(content);
    let mut envelopes = Vec::new();
    let mut skipped = Vec::new();

    for item in reader.by_ref() {
        match item {
            Ok(parsed) => envelopes.push(parsed.envelope),
            Err(err @ LineError::MissingField { .. }) if policy == HeaderPolicy::Abort => {
                return Err(PipelineError::Line(err));
            }
            Err(err) if err.is_recoverable() => {
                let line_number = err.line().unwrap_or_default();
                warn!(line = line_number, kind = err.kind(), error = %err, "skipping input line");
                skipped.push(SkippedLine {
                    line_number,
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(PipelineError::Line(err)),
        }
    }

    let stats = reader.stats();
    Ok(IngestOutcome {
        envelopes,
        summary: IngestSummary {
            input_hash: blake3::hash(content).to_hex().to_string(),
            lines_read: stats.lines_read,
            blank_lines: stats.blank,
            prefiltered_lines: stats.prefiltered,
            parsed_lines: stats.parsed,
            skipped,
        },
    })
}
