use chrono::{DateTime, NaiveDateTime, TimeZone as _, Utc};
use chrono_tz::Tz;
use polars::prelude::*;
use thiserror::Error;
use tracing::warn;

pub const SOURCE_COLUMN: &str = "ReceiveTimestampUtc";

const ACCEPTED_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error)]
#[error("invalid UTC timestamp '{value}': {source}")]
pub struct TimestampParseError {
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

/// A derived column holding the receive time re-expressed in `tz`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneColumn {
    pub column: String,
    pub tz: Tz,
}

impl ZoneColumn {
    pub fn new(column: impl Into<String>, tz: Tz) -> Self {
        Self {
            column: column.into(),
            tz,
        }
    }

    /// Name of the companion time-of-day column used by the time window.
    pub fn time_of_day_column(&self) -> String {
        time_of_day_column(&self.column)
    }
}

pub fn time_of_day_column(column: &str) -> String {
    format!("{column}_HMS")
}

/// Reads a `Z`-suffixed ISO-8601 timestamp as a naive wall time and pins it to UTC.
pub fn parse_utc_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    let trimmed = raw.trim();
    let naive_text = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    let mut result = NaiveDateTime::parse_from_str(naive_text, ACCEPTED_FORMATS[0]);
    for format in &ACCEPTED_FORMATS[1..] {
        if result.is_ok() {
            break;
        }
        result = NaiveDateTime::parse_from_str(naive_text, format);
    }

    result
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|source| TimestampParseError {
            value: raw.to_string(),
            source,
        })
}

pub fn format_local(timestamp: &DateTime<Utc>, tz: Tz) -> (String, String) {
    let local = timestamp.with_timezone(&tz);
    (
        local.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string(),
        local.format("%H:%M:%S").to_string(),
    )
}

/// Appends, for every zone, the localized receive timestamp and its `_HMS`
/// time of day. Rows whose source value is null or unreadable get nulls.
pub fn localize_timestamps(df: &DataFrame, zones: &[ZoneColumn]) -> Result<DataFrame, PolarsError> {
    let len = df.height();

    let parsed: Vec<Option<DateTime<Utc>>> = match df.column(SOURCE_COLUMN) {
        Ok(column) => {
            let raw = column.str()?;
            (0..len)
                .map(|idx| {
                    let value = raw.get(idx)?;
                    match parse_utc_timestamp(value) {
                        Ok(ts) => Some(ts),
                        Err(err) => {
                            warn!(row = idx, error = %err, "receive timestamp left unlocalized");
                            None
                        }
                    }
                })
                .collect()
        }
        Err(_) => vec![None; len],
    };

    let mut columns: Vec<Column> = Vec::with_capacity(zones.len() * 2);
    for zone in zones {
        let mut stamps: Vec<Option<String>> = Vec::with_capacity(len);
        let mut times: Vec<Option<String>> = Vec::with_capacity(len);
        for ts in &parsed {
            match ts {
                Some(ts) => {
                    let (stamp, time) = format_local(ts, zone.tz);
                    stamps.push(Some(stamp));
                    times.push(Some(time));
                }
                None => {
                    stamps.push(None);
                    times.push(None);
                }
            }
        }

        let stamps: Vec<Option<&str>> = stamps.iter().map(|v| v.as_deref()).collect();
        let times: Vec<Option<&str>> = times.iter().map(|v| v.as_deref()).collect();
        columns.push(Series::new(zone.column.as_str().into(), stamps).into());
        columns.push(Series::new(zone.time_of_day_column().into(), times).into());
    }

    let mut output = df.clone();
    output.hstack_mut(columns.as_mut_slice())?;
    Ok(output)
}
