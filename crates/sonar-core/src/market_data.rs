//! Market data source contract and the bar fetcher built on top of it.
//!
//! | Piece | Description |
//! |-------|-------------|
//! | [`MarketDataSource`] | Provider adapter trait (aggregates + market status) |
//! | [`AggregatesQuery`] | Fully resolved bar query sent upstream |
//! | [`QueryWindowPolicy`] | Which dates a query covers for a given timeframe |
//! | [`MarketDataFetcher`] | `fetch(symbol, timeframe, range)` |
//! | [`FetchError`] | Structured failure with a stable machine code |
//!
//! The fetcher makes exactly one upstream call per `fetch` and never retries;
//! retry policy, if any, belongs to the caller.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use time::Date;

use crate::config::LEGACY_PINNED_DAY;
use crate::{DateRange, MarketStatusSnapshot, SeriesResponse, Symbol, Timeframe};

/// Classification of market data failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Required provider credential is absent.
    Configuration,
    InvalidRequest,
    /// Network failure before a response arrived.
    Transport,
    /// Upstream answered with a non-2xx status.
    Status,
    /// Upstream answered 2xx with a body that could not be normalised.
    Decode,
}

/// Structured market data error carrying a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    status: Option<u16>,
}

impl FetchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Configuration, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::InvalidRequest, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Transport, message)
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(FetchErrorKind::Status, message)
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Decode, message)
    }

    fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Upstream HTTP status, for [`FetchErrorKind::Status`] errors.
    pub const fn upstream_status(&self) -> Option<u16> {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::Configuration => "fetch.configuration",
            FetchErrorKind::InvalidRequest => "fetch.invalid_request",
            FetchErrorKind::Transport => "fetch.transport",
            FetchErrorKind::Status => "fetch.status",
            FetchErrorKind::Decode => "fetch.decode",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

/// Sort order requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Resolved aggregates query: everything needed to build the upstream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatesQuery {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub from: Date,
    pub to: Date,
    pub adjusted: bool,
    pub sort: SortOrder,
}

/// Decides which dates a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWindowPolicy {
    /// Granularities coarser than one minute query this single day regardless of the
    /// selected range. One-minute queries always use the selected range.
    PinnedDay(Date),
    /// Every granularity uses the selected range.
    UserRange,
}

impl Default for QueryWindowPolicy {
    fn default() -> Self {
        Self::PinnedDay(LEGACY_PINNED_DAY)
    }
}

impl QueryWindowPolicy {
    pub fn window(self, timeframe: Timeframe, range: DateRange) -> (Date, Date) {
        match self {
            Self::PinnedDay(day) if !timeframe.is_finest() => (day, day),
            _ => (range.start(), range.end()),
        }
    }
}

/// Provider adapter contract.
///
/// Implementations issue one upstream call per method invocation.
pub trait MarketDataSource: Send + Sync {
    /// Provider name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Fetch OHLCV aggregates for a resolved query.
    fn aggregates<'a>(
        &'a self,
        query: AggregatesQuery,
    ) -> Pin<Box<dyn Future<Output = Result<SeriesResponse, FetchError>> + Send + 'a>>;

    /// Fetch the current market status.
    fn market_status<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<MarketStatusSnapshot, FetchError>> + Send + 'a>>;
}

/// Turns `(symbol, timeframe, range)` into one aggregates request.
#[derive(Clone)]
pub struct MarketDataFetcher {
    source: Arc<dyn MarketDataSource>,
    window_policy: QueryWindowPolicy,
}

impl MarketDataFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            window_policy: QueryWindowPolicy::default(),
        }
    }

    pub fn with_window_policy(mut self, window_policy: QueryWindowPolicy) -> Self {
        self.window_policy = window_policy;
        self
    }

    pub fn source(&self) -> &Arc<dyn MarketDataSource> {
        &self.source
    }

    pub const fn window_policy(&self) -> QueryWindowPolicy {
        self.window_policy
    }

    pub fn query_for(&self, symbol: &Symbol, timeframe: Timeframe, range: DateRange) -> AggregatesQuery {
        let (from, to) = self.window_policy.window(timeframe, range);
        AggregatesQuery {
            symbol: symbol.clone(),
            timeframe,
            from,
            to,
            adjusted: true,
            sort: SortOrder::Ascending,
        }
    }

    /// Fetch bars. Bars come back in provider order; no re-sort is performed.
    pub async fn fetch(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        range: DateRange,
    ) -> Result<SeriesResponse, FetchError> {
        let query = self.query_for(symbol, timeframe, range);
        log::debug!(
            "fetching {} {}m bars {}..{} from {}",
            query.symbol,
            query.timeframe.minutes(),
            query.from,
            query.to,
            self.source.name()
        );

        let result = self.source.aggregates(query).await;
        if let Err(error) = &result {
            log::warn!("bar fetch for {symbol} failed: {error}");
        }
        result
    }
}
