use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::LineError;
use crate::markets::{MarketField, MarketType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureId {
    pub id: i64,
    pub client_id: String,
}

/// One decoded input line: the fixture header plus every non-empty market array.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpdateEnvelope {
    pub fixture_id: FixtureId,
    pub is_offered_in_play: bool,
    pub markets: Vec<MarketUpdates>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketUpdates {
    pub market: MarketType,
    pub entries: Vec<MarketUpdateEntry>,
}

/// A single element of a market array. Every field is optional; values of an
/// unexpected JSON type read as absent rather than failing the line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketUpdateEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_update_timestamp_utc: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub receive_timestamp_utc: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub period_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub period_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bookmaker: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "lenient_text")]
    pub bet_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_suspended: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source_bookmaker: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub player_participant_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub team_participant_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub aggregate_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub line: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub over_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub under_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub home_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub away_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Text(&'a str),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl MarketUpdateEntry {
    pub fn field(&self, field: MarketField) -> FieldValue<'_> {
        fn text(value: &Option<String>) -> FieldValue<'_> {
            value.as_deref().map_or(FieldValue::Null, FieldValue::Text)
        }
        fn float(value: Option<f64>) -> FieldValue<'static> {
            value.map_or(FieldValue::Null, FieldValue::Float)
        }

        match field {
            MarketField::LastUpdateTimestampUtc => text(&self.last_update_timestamp_utc),
            MarketField::ReceiveTimestampUtc => text(&self.receive_timestamp_utc),
            MarketField::EventId => text(&self.event_id),
            MarketField::PeriodType => text(&self.period_type),
            MarketField::PeriodNumber => self
                .period_number
                .map_or(FieldValue::Null, FieldValue::Integer),
            MarketField::Bookmaker => text(&self.bookmaker),
            MarketField::Type => text(&self.bet_type),
            MarketField::IsSuspended => self
                .is_suspended
                .map_or(FieldValue::Null, FieldValue::Boolean),
            MarketField::SourceBookmaker => text(&self.source_bookmaker),
            MarketField::PlayerParticipantId => text(&self.player_participant_id),
            MarketField::TeamParticipantId => text(&self.team_participant_id),
            MarketField::AggregateType => text(&self.aggregate_type),
            MarketField::Line => float(self.line),
            MarketField::OverPrice => float(self.over_price),
            MarketField::UnderPrice => float(self.under_price),
            MarketField::HomePrice => float(self.home_price),
            MarketField::AwayPrice => float(self.away_price),
        }
    }
}

impl RawUpdateEnvelope {
    /// Builds an envelope from an already parsed JSON object. Errors carry line 0;
    /// the reader stamps the real line number.
    pub fn from_json(value: Value) -> Result<Self, LineError> {
        let Value::Object(mut object) = value else {
            return Err(LineError::MissingField {
                line: 0,
                field: "FixtureId.Id",
            });
        };

        let fixture_id = read_fixture_id(&object)?;
        let is_offered_in_play = object
            .get("IsOfferedInPlay")
            .and_then(Value::as_bool)
            .ok_or(LineError::MissingField {
                line: 0,
                field: "IsOfferedInPlay",
            })?;

        let mut markets = Vec::new();
        for market in MarketType::ALL {
            let Some(Value::Array(items)) = object.remove(market.key()) else {
                continue;
            };
            if items.is_empty() {
                continue;
            }

            let mut entries = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                if !item.is_object() {
                    return Err(LineError::MalformedEntry {
                        line: 0,
                        market,
                        index,
                    });
                }
                let entry = serde_json::from_value::<MarketUpdateEntry>(item).map_err(|_| {
                    LineError::MalformedEntry {
                        line: 0,
                        market,
                        index,
                    }
                })?;
                entries.push(entry);
            }
            markets.push(MarketUpdates { market, entries });
        }

        Ok(Self {
            fixture_id,
            is_offered_in_play,
            markets,
        })
    }

    pub fn entry_count(&self) -> usize {
        self.markets.iter().map(|m| m.entries.len()).sum()
    }
}

fn read_fixture_id(object: &Map<String, Value>) -> Result<FixtureId, LineError> {
    let fixture = object.get("FixtureId");
    let id = fixture
        .and_then(|f| f.get("Id"))
        .and_then(value_as_i64)
        .ok_or(LineError::MissingField {
            line: 0,
            field: "FixtureId.Id",
        })?;
    let client_id = fixture
        .and_then(|f| f.get("ClientId"))
        .and_then(value_as_text)
        .ok_or(LineError::MissingField {
            line: 0,
            field: "FixtureId.ClientId",
        })?;
    Ok(FixtureId { id, client_id })
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
                .map(|v| v as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_text))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_i64))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_bool))
}
