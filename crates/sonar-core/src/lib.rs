//! # Sonar Core
//!
//! Market data pipeline for the Sonar assistant: validated inputs, one Polygon
//! adapter, chart shaping and a recurring market status poller.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Polygon) |
//! | [`chart`] | Bars to labelled close/high/low series, axis tick subsampling |
//! | [`config`] | Fixed constants and environment credentials |
//! | [`domain`] | Domain models (Symbol, Timeframe, DateRange, Bar, MarketStatusSnapshot) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction (buffered and streaming) |
//! | [`market_data`] | Data source trait and the bar fetcher |
//! | [`poller`] | Market status poller with start/stop handle |
//! | [`session`] | Chart view state with fetch generations |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sonar_core::{chart, DateRange, MarketDataFetcher, PolygonAdapter, Symbol, Timeframe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = MarketDataFetcher::new(Arc::new(PolygonAdapter::from_env()));
//!     let range = DateRange::parse("2023-06-01", "2023-06-02")??;
//!     let response = fetcher.fetch(&Symbol::parse("aapl")?, Timeframe::OneMinute, range).await?;
//!
//!     if let Some(series) = chart::transform(&response) {
//!         println!("{} points", series.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Upstream failures are [`FetchError`] values with a kind and a stable code:
//!
//! ```rust
//! use sonar_core::{FetchError, FetchErrorKind};
//!
//! fn describe(error: &FetchError) -> &'static str {
//!     match error.kind() {
//!         FetchErrorKind::Configuration => "deployment problem",
//!         FetchErrorKind::Transport | FetchErrorKind::Status => "try again later",
//!         _ => "bad data",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables only and never logged
//! - Keys travel in headers, never in URLs

pub mod adapters;
pub mod chart;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod market_data;
pub mod poller;
pub mod session;

// Adapter implementations
pub use adapters::PolygonAdapter;

// Chart shaping
pub use chart::{axis_tick_labels, ChartSeries, SeriesLine, StyleHints};

// Configuration
pub use config::Credentials;

// Domain models
pub use domain::{
    parse_date, validate, Bar, DateRange, DateRangeError, MarketState, MarketStatusSnapshot,
    SeriesResponse, Symbol, Timeframe, UtcDateTime,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    ByteStream, HttpAuth, HttpBody, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse,
    HttpStreamResponse, MultipartPart, NoopHttpClient, ReqwestHttpClient,
};

// Market data
pub use market_data::{
    AggregatesQuery, FetchError, FetchErrorKind, MarketDataFetcher, MarketDataSource,
    QueryWindowPolicy, SortOrder,
};

// Polling
pub use poller::{MarketStatusPoller, MarketStatusView, PollerHandle};

// Chart session
pub use session::{ChartQuery, ChartSession, CommitOutcome, FetchCompletion, FetchTicket};
