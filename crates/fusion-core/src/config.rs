use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use crate::calculator::ProbabilityMode;
use crate::filters::SuspendedRows;
use crate::ingest::HeaderPolicy;
use crate::localize::ZoneColumn;

pub const DEFAULT_WINDOW_COLUMN: &str = "ReceiveTimestampPacific";

pub const DEFAULT_OUTPUT_COLUMNS: [&str; 16] = [
    "FixtureId",
    "market_type",
    "PeriodType",
    "PeriodNumber",
    "Bookmaker",
    "Type",
    "Line",
    "PlayerParticipantId",
    "TeamParticipantId",
    "HomeTrueProb",
    "HomeTruePrice",
    "OverTrueProb",
    "OverTruePrice",
    "ReceiveTimestampEastern",
    "ReceiveTimestampCentral",
    "ReceiveTimestampPacific",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown time zone '{timezone}' for column {column}")]
    UnknownTimezone { column: String, timezone: String },
    #[error("zone column {0} is declared more than once")]
    DuplicateZoneColumn(String),
    #[error("window column {0} is not one of the configured zone columns")]
    UnknownWindowColumn(String),
}

/// Everything about a run that is not part of the filter: which zones to
/// derive, which columns to emit and the two policy switches.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub zones: Vec<ZoneColumn>,
    pub window_column: String,
    pub output_columns: Vec<String>,
    pub probability: ProbabilityMode,
    pub suspended_rows: SuspendedRows,
    pub missing_header: HeaderPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            window_column: DEFAULT_WINDOW_COLUMN.to_string(),
            output_columns: DEFAULT_OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            probability: ProbabilityMode::default(),
            suspended_rows: SuspendedRows::default(),
            missing_header: HeaderPolicy::default(),
        }
    }
}

fn default_zones() -> Vec<ZoneColumn> {
    vec![
        ZoneColumn::new("ReceiveTimestampEastern", chrono_tz::America::New_York),
        ZoneColumn::new("ReceiveTimestampCentral", chrono_tz::America::Chicago),
        ZoneColumn::new("ReceiveTimestampPacific", chrono_tz::America::Los_Angeles),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawZone {
    column: String,
    timezone: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    zones: Option<Vec<RawZone>>,
    window_column: Option<String>,
    output_columns: Option<Vec<String>>,
    probability: Option<ProbabilityMode>,
    suspended_rows: Option<SuspendedRows>,
    missing_header: Option<HeaderPolicy>,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses a TOML document; keys that are left out keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        let defaults = PipelineConfig::default();

        let zones = match raw.zones {
            Some(zones) => zones
                .into_iter()
                .map(|zone| {
                    let tz: Tz = zone.timezone.parse().map_err(|_| ConfigError::UnknownTimezone {
                        column: zone.column.clone(),
                        timezone: zone.timezone.clone(),
                    })?;
                    Ok(ZoneColumn::new(zone.column, tz))
                })
                .collect::<Result<Vec<_>, ConfigError>>()?,
            None => defaults.zones,
        };

        let config = Self {
            zones,
            window_column: raw.window_column.unwrap_or(defaults.window_column),
            output_columns: raw.output_columns.unwrap_or(defaults.output_columns),
            probability: raw.probability.unwrap_or(defaults.probability),
            suspended_rows: raw.suspended_rows.unwrap_or(defaults.suspended_rows),
            missing_header: raw.missing_header.unwrap_or(defaults.missing_header),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for zone in &self.zones {
            if !seen.insert(zone.column.as_str()) {
                return Err(ConfigError::DuplicateZoneColumn(zone.column.clone()));
            }
        }
        if !seen.contains(self.window_column.as_str()) {
            return Err(ConfigError::UnknownWindowColumn(self.window_column.clone()));
        }
        Ok(())
    }

    pub fn window_zone(&self) -> Option<&ZoneColumn> {
        self.zones
            .iter()
            .find(|zone| zone.column == self.window_column)
    }
}
