pub mod calculator;
pub mod config;
pub mod error;
pub mod filters;
pub mod flatten;
pub mod ingest;
pub mod localize;
pub mod outputs;
pub mod pipeline;
