// crates/fusion-core/src/error.rs

use fusion_parser::LineError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::filters::FilterError;
use crate::flatten::FlattenError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input line rejected: {0}")]
    Line(#[from] LineError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Flattening failed: {0}")]
    Flatten(#[from] FlattenError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
