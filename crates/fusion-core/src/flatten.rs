use fusion_parser::{
    FieldKind, FieldValue, MarketField, MarketType, RawUpdateEnvelope, COMMON_FIELDS,
};
use polars::prelude::{Column, DataFrame, NamedFrom, PolarsError, Series};
use thiserror::Error;

pub const HEADER_COLUMNS: [&str; 4] = ["FixtureId", "ClientId", "IsOfferedInPlay", "market_type"];

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("flattened {found} rows but the envelopes hold {expected} entries")]
    RowCountMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

enum ColumnBuffer {
    Text(Vec<Option<String>>),
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
}

impl ColumnBuffer {
    fn for_kind(kind: FieldKind, capacity: usize) -> Self {
        match kind {
            FieldKind::Text => ColumnBuffer::Text(Vec::with_capacity(capacity)),
            FieldKind::Integer => ColumnBuffer::Integer(Vec::with_capacity(capacity)),
            FieldKind::Float => ColumnBuffer::Float(Vec::with_capacity(capacity)),
            FieldKind::Boolean => ColumnBuffer::Boolean(Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, value: FieldValue<'_>) {
        match self {
            ColumnBuffer::Text(values) => values.push(match value {
                FieldValue::Text(text) => Some(text.to_string()),
                _ => None,
            }),
            ColumnBuffer::Integer(values) => values.push(match value {
                FieldValue::Integer(number) => Some(number),
                _ => None,
            }),
            ColumnBuffer::Float(values) => values.push(match value {
                FieldValue::Float(number) => Some(number),
                _ => None,
            }),
            ColumnBuffer::Boolean(values) => values.push(match value {
                FieldValue::Boolean(flag) => Some(flag),
                _ => None,
            }),
        }
    }

    fn into_series(self, name: &str) -> Series {
        match self {
            ColumnBuffer::Text(values) => {
                let utf8: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
                Series::new(name.into(), utf8)
            }
            ColumnBuffer::Integer(values) => Series::new(name.into(), values),
            ColumnBuffer::Float(values) => Series::new(name.into(), values),
            ColumnBuffer::Boolean(values) => Series::new(name.into(), values),
        }
    }
}

/// The field columns a batch produces: every common field, then each
/// type-specific field declared by at least one market present in the batch.
pub fn field_columns(envelopes: &[RawUpdateEnvelope]) -> Vec<MarketField> {
    let present: Vec<MarketType> = MarketType::ALL
        .into_iter()
        .filter(|market| {
            envelopes
                .iter()
                .flat_map(|envelope| &envelope.markets)
                .any(|updates| updates.market == *market && !updates.entries.is_empty())
        })
        .collect();

    let mut fields: Vec<MarketField> = COMMON_FIELDS.to_vec();
    for market in MarketType::ALL {
        if !present.contains(&market) {
            continue;
        }
        for field in market.specific_fields() {
            if !fields.contains(field) {
                fields.push(*field);
            }
        }
    }
    fields
}

/// Emits one row per (envelope, market type, entry), in input order, then
/// market declaration order, then array order.
pub fn flatten_envelopes(envelopes: &[RawUpdateEnvelope]) -> Result<DataFrame, FlattenError> {
    let expected: usize = envelopes.iter().map(RawUpdateEnvelope::entry_count).sum();
    let fields = field_columns(envelopes);

    let mut fixture_ids: Vec<i64> = Vec::with_capacity(expected);
    let mut client_ids: Vec<&str> = Vec::with_capacity(expected);
    let mut in_play: Vec<bool> = Vec::with_capacity(expected);
    let mut market_types: Vec<&'static str> = Vec::with_capacity(expected);
    let mut buffers: Vec<ColumnBuffer> = fields
        .iter()
        .map(|field| ColumnBuffer::for_kind(field.kind(), expected))
        .collect();

    for envelope in envelopes {
        for updates in &envelope.markets {
            for entry in &updates.entries {
                fixture_ids.push(envelope.fixture_id.id);
                client_ids.push(envelope.fixture_id.client_id.as_str());
                in_play.push(envelope.is_offered_in_play);
                market_types.push(updates.market.key());

                for (field, buffer) in fields.iter().zip(buffers.iter_mut()) {
                    if updates.market.declares(*field) {
                        buffer.push(entry.field(*field));
                    } else {
                        buffer.push(FieldValue::Null);
                    }
                }
            }
        }
    }

    if fixture_ids.len() != expected {
        return Err(FlattenError::RowCountMismatch {
            expected,
            found: fixture_ids.len(),
        });
    }

    let mut columns: Vec<Column> = Vec::with_capacity(HEADER_COLUMNS.len() + fields.len());
    columns.push(Series::new(HEADER_COLUMNS[0].into(), fixture_ids).into());
    columns.push(Series::new(HEADER_COLUMNS[1].into(), client_ids).into());
    columns.push(Series::new(HEADER_COLUMNS[2].into(), in_play).into());
    columns.push(Series::new(HEADER_COLUMNS[3].into(), market_types).into());
    for (field, buffer) in fields.iter().zip(buffers) {
        columns.push(buffer.into_series(field.column_name()).into());
    }

    Ok(DataFrame::new(columns)?)
}
