use fusion_core::filters::{apply_filters, EqualityFilter, FilterError, FilterSpec, SuspendedRows};
use polars::prelude::*;

const WINDOW: &str = "ReceiveTimestampPacific";

fn table() -> PolarsResult<DataFrame> {
    df!(
        "market_type" => &["MoneylineUpdates", "TotalsUpdates", "MoneylineUpdates", "SpreadUpdates", "TotalsUpdates"],
        "Bookmaker" => &[Some("BetMGM"), Some("BetMGM"), Some("Bovada"), None, Some("Coral")],
        "PeriodNumber" => &[Some(0i64), Some(1), Some(0), Some(2), None],
        "Line" => &[None, Some(221.5f64), None, Some(-3.5), Some(210.0)],
        "IsSuspended" => &[Some(false), Some(false), Some(true), None, Some(false)],
        "ReceiveTimestampPacific_HMS" => &[Some("09:59:59"), Some("10:00:00"), Some("10:30:00"), Some("11:30:00"), None],
    )
}

fn markets(df: &DataFrame) -> PolarsResult<Vec<String>> {
    Ok(df
        .column("market_type")?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

#[test]
fn suspended_rows_follow_policy() -> PolarsResult<()> {
    let df = table()?;
    let spec = FilterSpec::default();

    let dropped = apply_filters(&df, &spec, WINDOW, SuspendedRows::Drop)?;
    assert_eq!(dropped.height(), 4, "null IsSuspended is not treated as suspended");
    assert_eq!(dropped.column("Bookmaker")?.str()?.get(2), None);

    let kept = apply_filters(&df, &spec, WINDOW, SuspendedRows::Keep)?;
    assert_eq!(kept.height(), 5);

    Ok(())
}

#[test]
fn equality_filters_compare_in_column_type() -> PolarsResult<()> {
    let df = table()?;

    let spec = FilterSpec::builder()
        .equals("PeriodNumber", "0")
        .build()
        .unwrap();
    let result = apply_filters(&df, &spec, WINDOW, SuspendedRows::Keep)?;
    assert_eq!(markets(&result)?, vec!["MoneylineUpdates", "MoneylineUpdates"]);

    let spec = FilterSpec::builder().equals("Line", "221.5").build().unwrap();
    let result = apply_filters(&df, &spec, WINDOW, SuspendedRows::Keep)?;
    assert_eq!(markets(&result)?, vec!["TotalsUpdates"]);

    let spec = FilterSpec::builder().equals("Line", "abc").build().unwrap();
    let result = apply_filters(&df, &spec, WINDOW, SuspendedRows::Keep)?;
    assert_eq!(result.height(), 0);

    let spec = FilterSpec::builder()
        .equals("IsSuspended", "True")
        .build()
        .unwrap();
    let result = apply_filters(&df, &spec, WINDOW, SuspendedRows::Keep)?;
    assert_eq!(result.column("Bookmaker")?.str()?.get(0), Some("Bovada"));

    Ok(())
}

#[test]
fn filters_combine_and_unknown_columns_are_ignored() -> PolarsResult<()> {
    let df = table()?;
    let spec = FilterSpec::builder()
        .equals("market_type", "TotalsUpdates")
        .equals("NoSuchColumn", "anything")
        .filter("Bookmaker=BetMGM".parse().unwrap())
        .build()
        .unwrap();

    let result = apply_filters(&df, &spec, WINDOW, SuspendedRows::Drop)?;
    assert_eq!(result.height(), 1);
    assert_eq!(result.column("Line")?.f64()?.get(0), Some(221.5));

    Ok(())
}

#[test]
fn time_window_is_inclusive_and_drops_null_times() -> PolarsResult<()> {
    let df = table()?;
    let spec = FilterSpec::builder()
        .start_time("10:00:00")
        .end_time("11:30:00")
        .build()
        .unwrap();

    let result = apply_filters(&df, &spec, WINDOW, SuspendedRows::Keep)?;
    assert_eq!(
        markets(&result)?,
        vec!["TotalsUpdates", "MoneylineUpdates", "SpreadUpdates"]
    );

    let open_start = FilterSpec::builder().end_time("10:00:00").build().unwrap();
    let result = apply_filters(&df, &open_start, WINDOW, SuspendedRows::Keep)?;
    assert_eq!(result.height(), 2);

    Ok(())
}

#[test]
fn filtering_is_idempotent() -> PolarsResult<()> {
    let df = table()?;
    let spec = FilterSpec::builder()
        .equals("Bookmaker", "BetMGM")
        .start_time("09:00:00")
        .build()
        .unwrap();

    let once = apply_filters(&df, &spec, WINDOW, SuspendedRows::Drop)?;
    let twice = apply_filters(&once, &spec, WINDOW, SuspendedRows::Drop)?;
    assert!(once.equals_missing(&twice));
    assert_eq!(once.height(), 2);

    Ok(())
}

#[test]
fn builder_validates_time_bounds() {
    let err = FilterSpec::builder().start_time("25:00").build().unwrap_err();
    assert_eq!(err, FilterError::InvalidTime("25:00".to_string()));

    let blank = FilterSpec::builder().start_time("  ").end_time("").build().unwrap();
    assert!(blank.is_empty());

    assert!("Bookmaker".parse::<EqualityFilter>().is_err());
    let parsed: EqualityFilter = "Line=-3.5".parse().unwrap();
    assert_eq!(parsed.column, "Line");
    assert_eq!(parsed.value, "-3.5");
}
