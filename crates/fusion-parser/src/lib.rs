pub mod errors;
pub mod markets;
pub mod model;
mod reader;

pub use errors::LineError;
pub use markets::{FieldKind, MarketField, MarketType, PriceSides, COMMON_FIELDS};
pub use model::{
    FieldValue, FixtureId, MarketUpdateEntry, MarketUpdates, RawUpdateEnvelope,
};
pub use reader::{parse_envelope, EnvelopeReader, ParsedLine, ReaderStats};
