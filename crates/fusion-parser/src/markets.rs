use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The seven update arrays an envelope may carry, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketType {
    Totals,
    Moneyline,
    Spread,
    PlayerYesNo,
    PlayerOverUnder,
    PlayerNth,
    PlayerOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSides {
    HomeAway,
    OverUnder,
}

impl MarketType {
    pub const ALL: [MarketType; 7] = [
        MarketType::Totals,
        MarketType::Moneyline,
        MarketType::Spread,
        MarketType::PlayerYesNo,
        MarketType::PlayerOverUnder,
        MarketType::PlayerNth,
        MarketType::PlayerOver,
    ];

    /// Wire key of the array in the envelope, also used as the `market_type` tag.
    pub fn key(&self) -> &'static str {
        match self {
            MarketType::Totals => "TotalsUpdates",
            MarketType::Moneyline => "MoneylineUpdates",
            MarketType::Spread => "SpreadUpdates",
            MarketType::PlayerYesNo => "PlayerYesNoUpdates",
            MarketType::PlayerOverUnder => "PlayerOverUnderUpdates",
            MarketType::PlayerNth => "PlayerNthUpdates",
            MarketType::PlayerOver => "PlayerOverUpdates",
        }
    }

    pub fn specific_fields(&self) -> &'static [MarketField] {
        use MarketField::*;
        match self {
            MarketType::Totals => &[Line, OverPrice, UnderPrice],
            MarketType::Moneyline => &[HomePrice, AwayPrice],
            MarketType::Spread => &[Line, HomePrice, AwayPrice],
            MarketType::PlayerYesNo => &[Line],
            MarketType::PlayerOverUnder => &[AggregateType, Line, OverPrice, UnderPrice],
            MarketType::PlayerNth => &[Line],
            MarketType::PlayerOver => &[Line],
        }
    }

    pub fn declares(&self, field: MarketField) -> bool {
        COMMON_FIELDS.contains(&field) || self.specific_fields().contains(&field)
    }

    pub fn price_sides(&self) -> Option<PriceSides> {
        match self {
            MarketType::Moneyline | MarketType::Spread => Some(PriceSides::HomeAway),
            MarketType::Totals | MarketType::PlayerOverUnder => Some(PriceSides::OverUnder),
            MarketType::PlayerYesNo | MarketType::PlayerNth | MarketType::PlayerOver => None,
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MarketType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        MarketType::ALL
            .into_iter()
            .find(|market| market.key() == value.trim())
            .ok_or_else(|| format!("unknown market type '{value}'"))
    }
}

/// Storage class of a field once it lands in a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketField {
    LastUpdateTimestampUtc,
    ReceiveTimestampUtc,
    EventId,
    PeriodType,
    PeriodNumber,
    Bookmaker,
    Type,
    IsSuspended,
    SourceBookmaker,
    PlayerParticipantId,
    TeamParticipantId,
    AggregateType,
    Line,
    OverPrice,
    UnderPrice,
    HomePrice,
    AwayPrice,
}

/// Fields read from every entry regardless of market type.
pub const COMMON_FIELDS: [MarketField; 11] = [
    MarketField::LastUpdateTimestampUtc,
    MarketField::ReceiveTimestampUtc,
    MarketField::EventId,
    MarketField::PeriodType,
    MarketField::PeriodNumber,
    MarketField::Bookmaker,
    MarketField::Type,
    MarketField::IsSuspended,
    MarketField::SourceBookmaker,
    MarketField::PlayerParticipantId,
    MarketField::TeamParticipantId,
];

impl MarketField {
    pub fn column_name(&self) -> &'static str {
        match self {
            MarketField::LastUpdateTimestampUtc => "LastUpdateTimestampUtc",
            MarketField::ReceiveTimestampUtc => "ReceiveTimestampUtc",
            MarketField::EventId => "EventId",
            MarketField::PeriodType => "PeriodType",
            MarketField::PeriodNumber => "PeriodNumber",
            MarketField::Bookmaker => "Bookmaker",
            MarketField::Type => "Type",
            MarketField::IsSuspended => "IsSuspended",
            MarketField::SourceBookmaker => "SourceBookmaker",
            MarketField::PlayerParticipantId => "PlayerParticipantId",
            MarketField::TeamParticipantId => "TeamParticipantId",
            MarketField::AggregateType => "AggregateType",
            MarketField::Line => "Line",
            MarketField::OverPrice => "OverPrice",
            MarketField::UnderPrice => "UnderPrice",
            MarketField::HomePrice => "HomePrice",
            MarketField::AwayPrice => "AwayPrice",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            MarketField::PeriodNumber => FieldKind::Integer,
            MarketField::IsSuspended => FieldKind::Boolean,
            MarketField::Line
            | MarketField::OverPrice
            | MarketField::UnderPrice
            | MarketField::HomePrice
            | MarketField::AwayPrice => FieldKind::Float,
            MarketField::LastUpdateTimestampUtc
            | MarketField::ReceiveTimestampUtc
            | MarketField::EventId
            | MarketField::PeriodType
            | MarketField::Bookmaker
            | MarketField::Type
            | MarketField::SourceBookmaker
            | MarketField::PlayerParticipantId
            | MarketField::TeamParticipantId
            | MarketField::AggregateType => FieldKind::Text,
        }
    }
}

impl fmt::Display for MarketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}
