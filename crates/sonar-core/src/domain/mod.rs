//! # Domain Models
//!
//! Typed values that flow through the market-data pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Uppercased, validated ticker |
//! | [`Timeframe`] | Bar granularity (1/5/15/30/60 minutes) |
//! | [`DateRange`] | Calendar range inside `[MIN_DATE, MAX_DATE]` |
//! | [`Bar`] | One OHLCV sample |
//! | [`SeriesResponse`] | Normalised aggregates response |
//! | [`MarketStatusSnapshot`] | Market, exchange and currency states |
//! | [`UtcDateTime`] | UTC instant |
//!
//! Construction validates invariants, so a value of these types is always usable:
//!
//! ```rust,ignore
//! use sonar_core::{DateRange, DateRangeError};
//!
//! let range = DateRange::parse("2023-06-01", "2023-06-02")??;
//! assert!(matches!(
//!     DateRange::parse("2023-06-03", "2023-06-02")?,
//!     Err(DateRangeError::StartAfterEnd)
//! ));
//! ```

mod date_range;
mod market_status;
mod models;
mod symbol;
mod timeframe;
mod timestamp;

pub use date_range::{parse_date, validate, DateRange, DateRangeError};
pub(crate) use date_range::format_date;
pub use market_status::{MarketState, MarketStatusSnapshot};
pub use models::{Bar, SeriesResponse};
pub use symbol::Symbol;
pub use timeframe::Timeframe;
pub use timestamp::UtcDateTime;
