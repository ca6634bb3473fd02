use std::path::PathBuf;

use fusion_core::calculator::ProbabilityMode;
use fusion_core::config::{ConfigError, PipelineConfig, DEFAULT_WINDOW_COLUMN};
use fusion_core::filters::SuspendedRows;
use fusion_core::ingest::HeaderPolicy;

#[test]
fn empty_document_yields_defaults() {
    let config = PipelineConfig::from_toml_str("").expect("empty config is valid");
    assert_eq!(config.zones.len(), 3);
    assert_eq!(config.window_column, DEFAULT_WINDOW_COLUMN);
    assert_eq!(config.probability, ProbabilityMode::MarginNormalized);
    assert_eq!(config.suspended_rows, SuspendedRows::Drop);
    assert_eq!(config.missing_header, HeaderPolicy::Skip);
    assert_eq!(
        config.window_zone().map(|zone| zone.tz),
        Some(chrono_tz::America::Los_Angeles)
    );
}

#[test]
fn overrides_zones_columns_and_policies() {
    let config = PipelineConfig::from_toml_str(
        r#"
            window_column = "ReceiveTimestampLondon"
            output_columns = ["FixtureId", "HomeTruePrice", "ReceiveTimestampLondon"]
            probability = "reciprocal"
            suspended_rows = "keep"
            missing_header = "abort"

            [[zones]]
            column = "ReceiveTimestampLondon"
            timezone = "Europe/London"
        "#,
    )
    .expect("config should parse");

    assert_eq!(config.zones.len(), 1);
    assert_eq!(config.zones[0].tz, chrono_tz::Europe::London);
    assert_eq!(config.output_columns.len(), 3);
    assert_eq!(config.probability, ProbabilityMode::Reciprocal);
    assert_eq!(config.suspended_rows, SuspendedRows::Keep);
    assert_eq!(config.missing_header, HeaderPolicy::Abort);
}

#[test]
fn rejects_unknown_zones_and_window_columns() {
    let err = PipelineConfig::from_toml_str(
        r#"
            [[zones]]
            column = "ReceiveTimestampPacific"
            timezone = "Mars/Olympus_Mons"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownTimezone { .. }));

    let err = PipelineConfig::from_toml_str(r#"window_column = "ReceiveTimestampMountain""#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownWindowColumn(_)));

    let err = PipelineConfig::from_toml_str(r#"probabilty = "reciprocal""#).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn example_config_matches_defaults() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fusion.example.toml");
    let loaded = PipelineConfig::load(&path).expect("example config should load");
    let defaults = PipelineConfig::default();

    assert_eq!(loaded.zones, defaults.zones);
    assert_eq!(loaded.output_columns, defaults.output_columns);
    assert_eq!(loaded.window_column, defaults.window_column);
}

#[test]
fn missing_config_file_reports_its_path() {
    let err = PipelineConfig::load(&PathBuf::from("/nonexistent/fusion.toml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/fusion.toml"));
}
