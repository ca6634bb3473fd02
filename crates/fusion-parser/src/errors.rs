use thiserror::Error;

use crate::markets::MarketType;

#[derive(Debug, Error)]
pub enum LineError {
    #[error("line {line} is not valid UTF-8")]
    Encoding { line: usize },

    #[error("line {line} is not valid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line} is missing required field {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line} {market} entry {index} is not an object")]
    MalformedEntry {
        line: usize,
        market: MarketType,
        index: usize,
    },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl LineError {
    /// Per-line failures leave the rest of the batch readable; I/O failures do not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LineError::Io(_))
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            LineError::Encoding { line }
            | LineError::Json { line, .. }
            | LineError::MissingField { line, .. }
            | LineError::MalformedEntry { line, .. } => Some(*line),
            LineError::Io(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LineError::Encoding { .. } => "encoding",
            LineError::Json { .. } => "json",
            LineError::MissingField { .. } => "missing_field",
            LineError::MalformedEntry { .. } => "malformed_entry",
            LineError::Io(_) => "io",
        }
    }

    /// A line error carries the line number it was raised for; the reader
    /// rewrites it once the number is known.
    pub(crate) fn at_line(self, number: usize) -> Self {
        match self {
            LineError::Encoding { .. } => LineError::Encoding { line: number },
            LineError::Json { source, .. } => LineError::Json {
                line: number,
                source,
            },
            LineError::MissingField { field, .. } => LineError::MissingField {
                line: number,
                field,
            },
            LineError::MalformedEntry { market, index, .. } => LineError::MalformedEntry {
                line: number,
                market,
                index,
            },
            LineError::Io(err) => LineError::Io(err),
        }
    }
}
