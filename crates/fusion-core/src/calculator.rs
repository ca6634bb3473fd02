use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How "true" probabilities are derived from a pair of decimal prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityMode {
    /// Both sides' implied probabilities are rescaled to sum to one.
    #[default]
    MarginNormalized,
    /// The bare reciprocal of one side's price, margin left in.
    Reciprocal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevigQuote {
    pub margin: Option<f64>,
    pub first_prob: f64,
    pub second_prob: Option<f64>,
    pub first_price: f64,
}

fn usable(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p > 0.0)
}

/// De-vigs a two-sided decimal-odds quote. Returns `None` when a required
/// price is missing, zero, negative or not finite.
pub fn devig(first: Option<f64>, second: Option<f64>, mode: ProbabilityMode) -> Option<DevigQuote> {
    let first = usable(first)?;
    match mode {
        ProbabilityMode::MarginNormalized => {
            let second = usable(second)?;
            let margin = 1.0 / second + 1.0 / first;
            let first_prob = (1.0 / first) / margin;
            Some(DevigQuote {
                margin: Some(margin),
                first_prob,
                second_prob: Some((1.0 / second) / margin),
                first_price: 1.0 / first_prob,
            })
        }
        ProbabilityMode::Reciprocal => {
            let first_prob = 1.0 / first;
            Some(DevigQuote {
                margin: None,
                first_prob,
                second_prob: usable(second).map(|p| 1.0 / p),
                first_price: 1.0 / first_prob,
            })
        }
    }
}

fn price_column(df: &DataFrame, name: &str) -> Result<Option<Float64Chunked>, PolarsError> {
    match df.column(name) {
        Ok(column) => Ok(Some(column.cast(&DataType::Float64)?.f64()?.clone())),
        Err(_) => Ok(None),
    }
}

struct SideColumns {
    margin: Vec<Option<f64>>,
    prob: Vec<Option<f64>>,
    price: Vec<Option<f64>>,
}

fn derive_side(
    df: &DataFrame,
    first: &str,
    second: &str,
    mode: ProbabilityMode,
) -> Result<SideColumns, PolarsError> {
    let len = df.height();
    let first = price_column(df, first)?;
    let second = price_column(df, second)?;

    let mut side = SideColumns {
        margin: Vec::with_capacity(len),
        prob: Vec::with_capacity(len),
        price: Vec::with_capacity(len),
    };

    for idx in 0..len {
        let a = first.as_ref().and_then(|c| c.get(idx));
        let b = second.as_ref().and_then(|c| c.get(idx));
        let quote = devig(a, b, mode);
        side.margin.push(quote.and_then(|q| q.margin));
        side.prob.push(quote.map(|q| q.first_prob));
        side.price.push(quote.map(|q| q.first_price));
    }

    Ok(side)
}

/// Adds margin, true probability and true price columns for the home side of
/// Home/Away markets and the over side of Over/Under markets.
pub fn apply_devig(df: &DataFrame, mode: ProbabilityMode) -> Result<DataFrame, PolarsError> {
    let home = derive_side(df, "HomePrice", "AwayPrice", mode)?;
    let over = derive_side(df, "OverPrice", "UnderPrice", mode)?;

    let mut output = df.clone();
    output.hstack_mut(&mut [
        Series::new("MarginHome".into(), home.margin).into(),
        Series::new("HomeTrueProb".into(), home.prob).into(),
        Series::new("HomeTruePrice".into(), home.price).into(),
        Series::new("MarginOver".into(), over.margin).into(),
        Series::new("OverTrueProb".into(), over.prob).into(),
        Series::new("OverTruePrice".into(), over.price).into(),
    ])?;

    Ok(output)
}
