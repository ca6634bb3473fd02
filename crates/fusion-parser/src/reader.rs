use std::io::BufRead;

use tracing::debug;

use crate::errors::LineError;
use crate::model::RawUpdateEnvelope;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub line_number: usize,
    pub envelope: RawUpdateEnvelope,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub lines_read: usize,
    pub blank: usize,
    pub prefiltered: usize,
    pub parsed: usize,
}

/// Lazily decodes newline-delimited update envelopes from a reader.
///
/// Blank lines and lines that are not wrapped in `{`/`}` are skipped without an
/// item. Every other line yields either an envelope or a [`LineError`]; only
/// [`LineError::Io`] means the underlying input can no longer be read.
pub struct EnvelopeReader<R> {
    input: R,
    buffer: Vec<u8>,
    stats: ReaderStats,
    finished: bool,
}

impl<R: BufRead> EnvelopeReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buffer: Vec::new(),
            stats: ReaderStats::default(),
            finished: false,
        }
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    fn next_line(&mut self) -> Option<Result<usize, LineError>> {
        self.buffer.clear();
        match self.input.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.stats.lines_read += 1;
                Some(Ok(self.stats.lines_read))
            }
            Err(err) => Some(Err(LineError::Io(err))),
        }
    }
}

impl<R: BufRead> Iterator for EnvelopeReader<R> {
    type Item = Result<ParsedLine, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let line_number = match self.next_line() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                Some(Ok(number)) => number,
            };

            let Ok(text) = std::str::from_utf8(&self.buffer) else {
                return Some(Err(LineError::Encoding { line: line_number }));
            };
            let trimmed = text.trim();

            if trimmed.is_empty() {
                self.stats.blank += 1;
                continue;
            }
            if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
                debug!(line = line_number, "skipping line without object delimiters");
                self.stats.prefiltered += 1;
                continue;
            }

            let result = parse_envelope(trimmed)
                .map(|envelope| ParsedLine {
                    line_number,
                    envelope,
                })
                .map_err(|err| err.at_line(line_number));
            if result.is_ok() {
                self.stats.parsed += 1;
            }
            return Some(result);
        }
    }
}

/// Parses a single trimmed line. Errors report line 0.
pub fn parse_envelope(line: &str) -> Result<RawUpdateEnvelope, LineError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|source| LineError::Json { line: 0, source })?;
    RawUpdateEnvelope::from_json(value)
}
