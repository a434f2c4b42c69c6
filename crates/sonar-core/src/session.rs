//! Chart view state driven by explicit search events.
//!
//! A [`ChartSession`] owns the latest [`SeriesResponse`], its derived [`ChartSeries`],
//! the error message and the loading flag. Every search takes a [`FetchTicket`] with a
//! monotonically increasing generation; only the newest generation may commit, so a
//! slow earlier fetch can never overwrite a later one.

use time::Date;

use crate::chart::{self, ChartSeries};
use crate::{CoreError, DateRange, FetchError, MarketDataFetcher, SeriesResponse, Symbol, Timeframe};

/// Raw search inputs as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartQuery {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start: Date,
    pub end: Date,
}

/// Permission to run one fetch on behalf of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    symbol: Symbol,
    timeframe: Timeframe,
    range: DateRange,
}

impl FetchTicket {
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Run the fetch. Does not touch the session, so several tickets may be in flight.
    pub async fn run(self, fetcher: &MarketDataFetcher) -> FetchCompletion {
        let result = fetcher.fetch(&self.symbol, self.timeframe, self.range).await;
        FetchCompletion {
            generation: self.generation,
            result,
        }
    }
}

/// Outcome of a ticket's fetch, waiting to be committed.
#[derive(Debug)]
pub struct FetchCompletion {
    pub generation: u64,
    pub result: Result<SeriesResponse, FetchError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// New data replaced the previous response.
    Applied,
    /// The fetch failed; previous data is kept and the error is set.
    Failed(FetchError),
    /// A newer ticket was issued after this one; the completion was dropped.
    Stale { generation: u64, latest: u64 },
}

#[derive(Debug, Default)]
pub struct ChartSession {
    response: Option<SeriesResponse>,
    chart: Option<ChartSeries>,
    error: Option<String>,
    loading: bool,
    latest: u64,
}

impl ChartSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response(&self) -> Option<&SeriesResponse> {
        self.response.as_ref()
    }

    pub fn chart(&self) -> Option<&ChartSeries> {
        self.chart.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Generation of the most recently issued ticket (0 before the first search).
    pub const fn latest_generation(&self) -> u64 {
        self.latest
    }

    /// Validate inputs and issue a ticket.
    ///
    /// The date range is checked first, then the symbol. On failure the error is
    /// recorded and no ticket is issued, so no request can be made.
    pub fn begin(&mut self, query: &ChartQuery) -> Result<FetchTicket, CoreError> {
        let checked = DateRange::new(query.start, query.end)
            .map_err(CoreError::from)
            .and_then(|range| {
                let symbol = Symbol::parse(&query.symbol)?;
                Ok((symbol, range))
            });

        let (symbol, range) = match checked {
            Ok(checked) => checked,
            Err(error) => {
                self.error = Some(error.to_string());
                return Err(error);
            }
        };

        self.latest += 1;
        self.loading = true;
        self.error = None;

        Ok(FetchTicket {
            generation: self.latest,
            symbol,
            timeframe: query.timeframe,
            range,
        })
    }

    /// Apply a completion if it belongs to the newest ticket.
    pub fn commit(&mut self, completion: FetchCompletion) -> CommitOutcome {
        if completion.generation != self.latest {
            log::debug!(
                "dropping stale chart fetch generation {} (latest {})",
                completion.generation,
                self.latest
            );
            return CommitOutcome::Stale {
                generation: completion.generation,
                latest: self.latest,
            };
        }

        self.loading = false;
        match completion.result {
            Ok(response) => {
                self.chart = chart::transform(&response);
                self.response = Some(response);
                self.error = None;
                CommitOutcome::Applied
            }
            Err(error) => {
                self.error = Some(error.message().to_owned());
                CommitOutcome::Failed(error)
            }
        }
    }

    /// Validate, fetch and commit in one step.
    pub async fn search(
        &mut self,
        fetcher: &MarketDataFetcher,
        query: &ChartQuery,
    ) -> Result<CommitOutcome, CoreError> {
        let ticket = self.begin(query)?;
        let completion = ticket.run(fetcher).await;
        match self.commit(completion) {
            CommitOutcome::Failed(error) => Err(CoreError::Fetch(error)),
            outcome => Ok(outcome),
        }
    }
}
