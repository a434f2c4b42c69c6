use thiserror::Error;

/// Validation and contract errors exposed by `sonar-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid timeframe '{value}', expected one of 1, 5, 15, 30, 60 (minutes)")]
    InvalidTimeframe { value: String },

    #[error("date must be an ISO 8601 calendar date (YYYY-MM-DD): '{value}'")]
    InvalidDate { value: String },

    #[error("timestamp must be RFC3339: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("epoch timestamp {millis}ms is out of range")]
    TimestampOutOfRange { millis: i64 },

    #[error("unknown market state '{value}'")]
    InvalidMarketState { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("bar high must be >= low")]
    InvalidBarRange,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    DateRange(#[from] crate::DateRangeError),

    #[error(transparent)]
    Fetch(#[from] crate::FetchError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
