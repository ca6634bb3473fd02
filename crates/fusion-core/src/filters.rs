use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::localize::time_of_day_column;

pub const SUSPENDED_COLUMN: &str = "IsSuspended";

const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid time '{0}', expected HH:MM:SS")]
    InvalidTime(String),
    #[error("filter '{0}' must look like COLUMN=VALUE")]
    InvalidAssignment(String),
}

/// Whether rows flagged `IsSuspended = true` survive filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspendedRows {
    #[default]
    Drop,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityFilter {
    pub column: String,
    pub value: String,
}

impl FromStr for EqualityFilter {
    type Err = FilterError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (column, value) = text
            .split_once('=')
            .ok_or_else(|| FilterError::InvalidAssignment(text.to_string()))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(FilterError::InvalidAssignment(text.to_string()));
        }
        Ok(Self {
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for EqualityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column, self.value)
    }
}

/// Inclusive time-of-day bounds; the calendar date never takes part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl TimeWindow {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start.map_or(true, |start| time >= start) && self.end.map_or(true, |end| time <= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    equals: Vec<EqualityFilter>,
    window: TimeWindow,
}

impl FilterSpec {
    pub fn builder() -> FilterSpecBuilder {
        FilterSpecBuilder::default()
    }

    pub fn equals(&self) -> &[EqualityFilter] {
        &self.equals
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty() && self.window.is_unbounded()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterSpecBuilder {
    equals: Vec<EqualityFilter>,
    start: Option<String>,
    end: Option<String>,
}

impl FilterSpecBuilder {
    pub fn equals(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.push(EqualityFilter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn filter(mut self, filter: EqualityFilter) -> Self {
        self.equals.push(filter);
        self
    }

    pub fn start_time(mut self, value: impl Into<String>) -> Self {
        self.start = Some(value.into());
        self
    }

    pub fn end_time(mut self, value: impl Into<String>) -> Self {
        self.end = Some(value.into());
        self
    }

    /// Blank bounds count as unset.
    pub fn build(self) -> Result<FilterSpec, FilterError> {
        Ok(FilterSpec {
            equals: self.equals,
            window: TimeWindow {
                start: parse_bound(self.start)?,
                end: parse_bound(self.end)?,
            },
        })
    }
}

fn parse_bound(value: Option<String>) -> Result<Option<NaiveTime>, FilterError> {
    match value {
        Some(text) if !text.trim().is_empty() => {
            NaiveTime::parse_from_str(text.trim(), TIME_FORMAT)
                .map(Some)
                .map_err(|_| FilterError::InvalidTime(text))
        }
        _ => Ok(None),
    }
}

fn suspended_mask(column: &Column) -> Result<Vec<bool>, PolarsError> {
    let flags = column.bool()?;
    Ok((0..flags.len()).map(|idx| flags.get(idx) != Some(true)).collect())
}

fn equality_mask(column: &Column, value: &str) -> Result<Vec<bool>, PolarsError> {
    let len = column.len();
    let trimmed = value.trim();

    let mask = match column.dtype() {
        DataType::String => {
            let values = column.str()?;
            (0..len).map(|idx| values.get(idx) == Some(value)).collect()
        }
        DataType::Int64 => {
            let values = column.i64()?;
            match trimmed.parse::<f64>() {
                Ok(target) => (0..len)
                    .map(|idx| values.get(idx).is_some_and(|v| v as f64 == target))
                    .collect(),
                Err(_) => vec![false; len],
            }
        }
        DataType::Float64 => {
            let values = column.f64()?;
            match trimmed.parse::<f64>() {
                Ok(target) => (0..len).map(|idx| values.get(idx) == Some(target)).collect(),
                Err(_) => vec![false; len],
            }
        }
        DataType::Boolean => {
            let values = column.bool()?;
            match trimmed.to_ascii_lowercase().parse::<bool>() {
                Ok(target) => (0..len).map(|idx| values.get(idx) == Some(target)).collect(),
                Err(_) => vec![false; len],
            }
        }
        _ => {
            let rendered = column.cast(&DataType::String)?;
            let values = rendered.str()?;
            (0..len).map(|idx| values.get(idx) == Some(value)).collect()
        }
    };

    Ok(mask)
}

fn window_mask(
    column: Option<&Column>,
    window: TimeWindow,
    len: usize,
) -> Result<Vec<bool>, PolarsError> {
    let Some(column) = column else {
        return Ok(vec![false; len]);
    };
    let times = column.str()?;
    Ok((0..len)
        .map(|idx| {
            times
                .get(idx)
                .and_then(|text| NaiveTime::parse_from_str(text, TIME_FORMAT).ok())
                .is_some_and(|time| window.contains(time))
        })
        .collect())
}

fn and_into(mask: &mut [bool], other: &[bool]) {
    for (keep, other) in mask.iter_mut().zip(other) {
        *keep &= *other;
    }
}

/// Drops suspended rows (per policy), then applies each equality filter and
/// the time window on `<window_column>_HMS`. Filters naming a column the
/// table lacks are ignored. Surviving rows keep their relative order.
pub fn apply_filters(
    df: &DataFrame,
    spec: &FilterSpec,
    window_column: &str,
    suspended: SuspendedRows,
) -> Result<DataFrame, PolarsError> {
    let len = df.height();
    let mut mask = vec![true; len];

    if suspended == SuspendedRows::Drop {
        if let Ok(column) = df.column(SUSPENDED_COLUMN) {
            and_into(&mut mask, &suspended_mask(column)?);
        }
    }

    for filter in spec.equals() {
        if let Ok(column) = df.column(&filter.column) {
            and_into(&mut mask, &equality_mask(column, &filter.value)?);
        }
    }

    let window = spec.window();
    if !window.is_unbounded() {
        let time_column = time_of_day_column(window_column);
        and_into(&mut mask, &window_mask(df.column(&time_column).ok(), window, len)?);
    }

    if mask.iter().all(|keep| *keep) {
        return Ok(df.clone());
    }

    let mask = BooleanChunked::new("mask".into(), mask);
    df.filter(&mask)
}
