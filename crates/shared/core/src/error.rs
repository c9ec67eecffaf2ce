use thiserror::Error;

/// A topic request rejected before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("no topic instances given for channel {0}")]
    NoSelectors(String),

    #[error("empty instrument id for channel {0}")]
    EmptyInstrumentId(String),

    #[error("empty instrument family for channel {0}")]
    EmptyInstrumentFamily(String),

    #[error("empty currency for channel {0}")]
    EmptyCurrency(String),

    #[error("channel {0} needs an instrument id or an instrument family")]
    MissingUnderlying(String),

    #[error("instrument type {inst_type} is not accepted by channel {channel}")]
    InstrumentTypeNotAllowed { channel: String, inst_type: String },

    #[error("unknown instrument type: {0}")]
    UnknownInstrumentType(String),

    #[error("unknown bar size: {0}")]
    UnknownBar(String),

    #[error("unknown order book channel: {0}")]
    UnknownBookDepth(String),
}

/// A positional record (candlestick, book level) that does not fit its shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("expected at least {expected} fields, got {got}")]
    TooShort { expected: usize, got: usize },

    #[error("invalid decimal in field {field}: {value}")]
    InvalidDecimal { field: &'static str, value: String },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
