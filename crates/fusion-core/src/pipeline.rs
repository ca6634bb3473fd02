use std::path::Path;

use polars::prelude::DataFrame;
use tracing::info;

use crate::calculator::apply_devig;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::filters::{apply_filters, FilterSpec};
use crate::flatten::flatten_envelopes;
use crate::ingest::{ingest, read_input, IngestSummary};
use crate::localize::localize_timestamps;
use crate::outputs::project;

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Filtered rows, projected to the configured output columns.
    pub table: DataFrame,
    /// Every flattened row with its derived columns, before filtering.
    pub derived: DataFrame,
    pub summary: IngestSummary,
}

impl PipelineOutput {
    pub fn derived_rows(&self) -> usize {
        self.derived.height()
    }
}

/// Flattens and derives the full table without filtering or projecting it.
pub fn derive_table(
    content: &[u8],
    config: &PipelineConfig,
) -> Result<(DataFrame, IngestSummary)> {
    config.validate()?;

    let outcome = ingest(content, config.missing_header)?;
    info!(
        envelopes = outcome.envelopes.len(),
        skipped = outcome.summary.skipped.len(),
        input_hash = %outcome.summary.input_hash,
        "Parsed input lines"
    );

    let flattened = flatten_envelopes(&outcome.envelopes)?;
    info!(rows = flattened.height(), "Flattened market updates");

    let localized = localize_timestamps(&flattened, &config.zones)?;
    let derived = apply_devig(&localized, config.probability)?;

    Ok((derived, outcome.summary))
}

pub fn process(content: &[u8], config: &PipelineConfig, spec: &FilterSpec) -> Result<PipelineOutput> {
    let (derived, summary) = derive_table(content, config)?;

    let filtered = apply_filters(&derived, spec, &config.window_column, config.suspended_rows)?;
    info!(
        derived_rows = derived.height(),
        kept_rows = filtered.height(),
        "Applied filters"
    );

    let table = project(&filtered, &config.output_columns)?;

    Ok(PipelineOutput {
        table,
        derived,
        summary,
    })
}

pub fn process_file(
    path: &Path,
    config: &PipelineConfig,
    spec: &FilterSpec,
) -> Result<PipelineOutput> {
    let content = read_input(path)?;
    process(&content, config, spec)
}
