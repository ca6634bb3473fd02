use std::fs;
use std::path::PathBuf;

use fusion_core::flatten::{field_columns, flatten_envelopes};
use fusion_parser::{parse_envelope, EnvelopeReader, MarketField, RawUpdateEnvelope};
use polars::prelude::*;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../fusion-parser/tests/data")
        .join(name)
}

fn fixture_envelopes() -> Vec<RawUpdateEnvelope> {
    let content =
        fs::read_to_string(fixture_path("sample_updates.jsonl")).expect("failed to read fixture");
    EnvelopeReader::new(content.as_bytes())
        .filter_map(Result::ok)
        .map(|parsed| parsed.envelope)
        .collect()
}

#[test]
fn flatten_emits_one_row_per_entry_in_declaration_order() -> PolarsResult<()> {
    let envelopes = fixture_envelopes();
    let expected_rows: usize = envelopes.iter().map(|e| e.entry_count()).sum();

    let df = flatten_envelopes(&envelopes).expect("flatten failed");
    assert_eq!(df.height(), expected_rows);
    assert_eq!(df.height(), 5);

    let markets: Vec<Option<&str>> = df.column("market_type")?.str()?.into_iter().collect();
    assert_eq!(
        markets,
        vec![
            Some("TotalsUpdates"),
            Some("MoneylineUpdates"),
            Some("MoneylineUpdates"),
            Some("SpreadUpdates"),
            Some("PlayerOverUnderUpdates"),
        ]
    );

    let fixtures: Vec<Option<i64>> = df.column("FixtureId")?.i64()?.into_iter().collect();
    assert_eq!(
        fixtures,
        vec![Some(1001), Some(1001), Some(1001), Some(1003), Some(1003)]
    );

    let bookmakers = df.column("Bookmaker")?.str()?;
    assert_eq!(bookmakers.get(1), Some("BetMGM"));
    assert_eq!(bookmakers.get(2), Some("DraftKingsNJ"));

    Ok(())
}

#[test]
fn type_specific_fields_stay_null_for_other_markets() -> PolarsResult<()> {
    let envelope = parse_envelope(
        r#"{"FixtureId":{"Id":1,"ClientId":"c1"},"IsOfferedInPlay":true,"MoneylineUpdates":[{"HomePrice":1.8,"AwayPrice":2.1,"Line":4.5}],"TotalsUpdates":[{"Line":210.5,"OverPrice":1.9,"UnderPrice":1.9}]}"#,
    )
    .expect("parse failed");

    let df = flatten_envelopes(&[envelope]).expect("flatten failed");
    let lines = df.column("Line")?.f64()?;
    let home = df.column("HomePrice")?.f64()?;

    // Totals is declared before Moneyline.
    assert_eq!(lines.get(0), Some(210.5));
    assert_eq!(home.get(0), None);
    assert_eq!(lines.get(1), None, "moneyline rows never carry Line");
    assert_eq!(home.get(1), Some(1.8));
    assert!(df.column("AggregateType").is_err());

    Ok(())
}

#[test]
fn absent_fields_are_null_not_zero() -> PolarsResult<()> {
    let envelope = parse_envelope(
        r#"{"FixtureId":{"Id":3,"ClientId":"c3"},"IsOfferedInPlay":false,"PlayerNthUpdates":[{"Bookmaker":"Coral"}]}"#,
    )
    .expect("parse failed");

    let df = flatten_envelopes(&[envelope]).expect("flatten failed");
    assert_eq!(df.height(), 1);
    assert_eq!(df.column("Line")?.f64()?.get(0), None);
    assert_eq!(df.column("PeriodNumber")?.i64()?.get(0), None);
    assert_eq!(df.column("IsSuspended")?.bool()?.get(0), None);
    assert_eq!(df.column("IsOfferedInPlay")?.bool()?.get(0), Some(false));
    assert!(df.column("HomePrice").is_err());

    Ok(())
}

#[test]
fn empty_batch_keeps_the_common_schema() {
    let df = flatten_envelopes(&[]).expect("flatten failed");
    assert_eq!(df.height(), 0);
    assert!(df.column("FixtureId").is_ok());
    assert!(df.column("ReceiveTimestampUtc").is_ok());
    assert!(df.column("Line").is_err());
}

#[test]
fn field_columns_follow_first_declaration() {
    let envelopes = fixture_envelopes();
    let fields = field_columns(&envelopes);
    let specific: Vec<MarketField> = fields[11..].to_vec();
    assert_eq!(
        specific,
        vec![
            MarketField::Line,
            MarketField::OverPrice,
            MarketField::UnderPrice,
            MarketField::HomePrice,
            MarketField::AwayPrice,
            MarketField::AggregateType,
        ]
    );
}
