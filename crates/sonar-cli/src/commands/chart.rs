use std::sync::Arc;

use serde::Serialize;
use sonar_core::{
    parse_date, ChartQuery, ChartSeries, ChartSession, MarketDataFetcher, MarketDataSource, QueryWindowPolicy,
    Timeframe,
};
use time::{Date, Duration, OffsetDateTime};

use crate::cli::ChartArgs;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ChartOutput<'a> {
    symbol: &'a str,
    timeframe: Timeframe,
    chart: Option<&'a ChartSeries>,
    axis_labels: Vec<String>,
}

pub async fn run(args: &ChartArgs, source: Arc<dyn MarketDataSource>, pretty: bool) -> Result<(), CliError> {
    let query = query_from_args(args, OffsetDateTime::now_utc().date())?;
    let policy = if args.honour_range {
        QueryWindowPolicy::UserRange
    } else {
        QueryWindowPolicy::default()
    };
    let fetcher = MarketDataFetcher::new(source).with_window_policy(policy);

    let mut session = ChartSession::new();
    session.search(&fetcher, &query).await?;
    let response = session
        .response()
        .ok_or_else(|| CliError::Command(String::from("search finished without a response")))?;

    if args.raw {
        return output::render(response, pretty);
    }

    let chart = session.chart();
    if chart.is_none() {
        log::warn!("no bars returned for {}", response.symbol);
    }
    output::render(
        &ChartOutput {
            symbol: response.symbol.as_str(),
            timeframe: response.timeframe,
            chart,
            axis_labels: chart.map(ChartSeries::axis_labels).unwrap_or_default(),
        },
        pretty,
    )
}

/// The year ending on `today`.
pub fn default_range(today: Date) -> (Date, Date) {
    let start = today
        .replace_year(today.year() - 1)
        .unwrap_or_else(|_| today - Duration::days(365));
    (start, today)
}

fn query_from_args(args: &ChartArgs, today: Date) -> Result<ChartQuery, CliError> {
    let (default_start, default_end) = default_range(today);
    let start = args.start.as_deref().map(parse_date).transpose()?.unwrap_or(default_start);
    let end = args.end.as_deref().map(parse_date).transpose()?.unwrap_or(default_end);
    let timeframe = args.timeframe.parse::<Timeframe>()?;

    Ok(ChartQuery {
        symbol: args.symbol.clone(),
        timeframe,
        start,
        end,
    })
}
