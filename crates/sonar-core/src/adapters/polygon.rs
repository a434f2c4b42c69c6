use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::{read_secret, POLYGON_API_KEY_ENV};
use crate::domain::format_date;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::market_data::{AggregatesQuery, FetchError, MarketDataSource};
use crate::{
    Bar, MarketState, MarketStatusSnapshot, SeriesResponse, Symbol, UtcDateTime, ValidationError,
};

pub const POLYGON_BASE_URL: &str = "https://api.polygon.io";

/// Polygon.io adapter for minute aggregates and market status.
#[derive(Clone)]
pub struct PolygonAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
}

impl PolygonAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key,
            base_url: String::from(POLYGON_BASE_URL),
        }
    }

    /// Real transport with the key from `POLYGON_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(
            Arc::new(ReqwestHttpClient::new()),
            read_secret(POLYGON_API_KEY_ENV),
        )
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn aggregates_url(&self, query: &AggregatesQuery) -> String {
        format!(
            "{}/v2/aggs/ticker/{}/range/{}/minute/{}/{}?adjusted={}&sort={}",
            self.base_url,
            query.symbol.path_segment(),
            query.timeframe.minutes(),
            format_date(query.from),
            format_date(query.to),
            query.adjusted,
            query.sort.as_str(),
        )
    }

    pub fn market_status_url(&self) -> String {
        format!("{}/v1/marketstatus/now", self.base_url)
    }

    async fn execute_authenticated_call(&self, url: String) -> Result<String, FetchError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            FetchError::configuration("Polygon API key is not configured")
        })?;

        let request = HttpRequest::get(url).with_auth(&HttpAuth::BearerToken(api_key.clone()));
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| FetchError::transport(format!("polygon transport error: {}", error.message())))?;

        if !response.is_success() {
            return Err(FetchError::status(
                response.status,
                format!(
                    "polygon upstream returned status {}{}",
                    response.status,
                    upstream_error_suffix(&response.body)
                ),
            ));
        }

        Ok(response.body)
    }
}

impl MarketDataSource for PolygonAdapter {
    fn name(&self) -> &'static str {
        "polygon"
    }

    fn aggregates<'a>(
        &'a self,
        query: AggregatesQuery,
    ) -> Pin<Box<dyn Future<Output = Result<SeriesResponse, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            if query.from > query.to {
                return Err(FetchError::invalid_request(
                    "polygon aggregates window must not end before it starts",
                ));
            }

            let body = self.execute_authenticated_call(self.aggregates_url(&query)).await?;
            let payload: PolygonAggregatesPayload = serde_json::from_str(&body)
                .map_err(|error| FetchError::decode(format!("polygon aggregates payload: {error}")))?;

            normalize_aggregates(payload, &query)
        })
    }

    fn market_status<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<MarketStatusSnapshot, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let body = self.execute_authenticated_call(self.market_status_url()).await?;
            let payload: PolygonMarketStatusPayload = serde_json::from_str(&body)
                .map_err(|error| FetchError::decode(format!("polygon market status payload: {error}")))?;

            normalize_market_status(payload).map_err(validation_to_error)
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolygonAggregatesPayload {
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    results_count: Option<usize>,
    #[serde(default)]
    adjusted: Option<bool>,
    #[serde(default)]
    results: Vec<PolygonAggregatePayload>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "request_id")]
    request_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct PolygonAggregatePayload {
    #[serde(rename = "t")]
    ts: i64,
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "v", default)]
    volume: f64,
    #[serde(rename = "vw", default)]
    vwap: Option<f64>,
    #[serde(rename = "n", default)]
    transactions: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolygonMarketStatusPayload {
    market: String,
    #[serde(default)]
    after_hours: bool,
    #[serde(default)]
    early_hours: bool,
    #[serde(default)]
    exchanges: BTreeMap<String, String>,
    #[serde(default)]
    currencies: BTreeMap<String, String>,
    server_time: String,
}

fn normalize_aggregates(
    payload: PolygonAggregatesPayload,
    query: &AggregatesQuery,
) -> Result<SeriesResponse, FetchError> {
    let symbol = match payload.ticker.as_deref() {
        Some(ticker) => Symbol::parse(ticker).map_err(validation_to_error)?,
        None => query.symbol.clone(),
    };

    let bars = payload
        .results
        .into_iter()
        .map(normalize_bar)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SeriesResponse {
        symbol,
        timeframe: query.timeframe,
        result_count: payload.results_count.unwrap_or(bars.len()),
        bars,
        request_id: payload.request_id.unwrap_or_default(),
        adjusted: payload.adjusted.unwrap_or(query.adjusted),
        status: payload.status.unwrap_or_default(),
    })
}

fn normalize_bar(payload: PolygonAggregatePayload) -> Result<Bar, FetchError> {
    let ts = UtcDateTime::from_unix_millis(payload.ts).map_err(validation_to_error)?;
    Bar::new(
        ts,
        payload.open,
        payload.high,
        payload.low,
        payload.close,
        payload.volume,
        payload.vwap,
        payload.transactions,
    )
    .map_err(validation_to_error)
}

fn normalize_market_status(
    payload: PolygonMarketStatusPayload,
) -> Result<MarketStatusSnapshot, ValidationError> {
    Ok(MarketStatusSnapshot {
        market: MarketState::from_str(&payload.market)?,
        exchanges: normalize_states(payload.exchanges)?,
        currencies: normalize_states(payload.currencies)?,
        after_hours: payload.after_hours,
        early_hours: payload.early_hours,
        server_time: UtcDateTime::parse(&payload.server_time)?,
    })
}

fn normalize_states(
    raw: BTreeMap<String, String>,
) -> Result<BTreeMap<String, MarketState>, ValidationError> {
    raw.into_iter()
        .map(|(name, state)| Ok((name.to_ascii_lowercase(), MarketState::from_str(&state)?)))
        .collect()
}

fn upstream_error_suffix(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error.or(parsed.message))
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

fn validation_to_error(error: ValidationError) -> FetchError {
    FetchError::decode(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse, HttpStreamResponse};
    use crate::market_data::{FetchErrorKind, SortOrder};
    use crate::Timeframe;
    use std::sync::Mutex;
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use time::macros::date;

    const AGGREGATES_BODY: &str = r#"{
        "ticker": "AAPL",
        "queryCount": 2,
        "resultsCount": 2,
        "adjusted": true,
        "results": [
            {"v": 1200.0, "vw": 180.12, "o": 180.0, "c": 180.3, "h": 180.5, "l": 179.9, "t": 1685626200000, "n": 42},
            {"v": 900.0, "o": 180.3, "c": 180.1, "h": 180.4, "l": 180.0, "t": 1685626260000}
        ],
        "status": "OK",
        "request_id": "6a7e466379af0a71039d60cc78e72282",
        "count": 2
    }"#;

    const STATUS_BODY: &str = r#"{
        "afterHours": true,
        "currencies": {"crypto": "open", "fx": "open"},
        "earlyHours": false,
        "exchanges": {"nasdaq": "extended-hours", "nyse": "extended-hours", "otc": "closed"},
        "market": "extended-hours",
        "serverTime": "2020-11-10T17:37:37-05:00"
    }"#;

    #[derive(Debug)]
    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn responding(status: u16, body: &str) -> Self {
            Self {
                response: Ok(HttpResponse::with_status(status, body)),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failure() -> Self {
            Self {
                response: Err(HttpError::new("network error")),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }

        fn execute_stream<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpStreamResponse, HttpError>> + Send + 'a>> {
            Box::pin(async move { Err(HttpError::new("streaming not used by polygon")) })
        }
    }

    fn query(timeframe: Timeframe) -> AggregatesQuery {
        AggregatesQuery {
            symbol: Symbol::parse("aapl").expect("valid symbol"),
            timeframe,
            from: date!(2023 - 06 - 01),
            to: date!(2023 - 06 - 02),
            adjusted: true,
            sort: SortOrder::Ascending,
        }
    }

    fn adapter(client: Arc<RecordingHttpClient>) -> PolygonAdapter {
        PolygonAdapter::new(client, Some(String::from("key-123")))
    }

    #[test]
    fn aggregates_request_carries_exact_parameters_and_bearer_auth() {
        let client = Arc::new(RecordingHttpClient::responding(200, AGGREGATES_BODY));
        let response =
            block_on(adapter(client.clone()).aggregates(query(Timeframe::OneMinute))).expect("ok");
        assert_eq!(response.bars.len(), 2);

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://api.polygon.io/v2/aggs/ticker/AAPL/range/1/minute/2023-06-01/2023-06-02?adjusted=true&sort=asc"
        );
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer key-123")
        );
    }

    #[test]
    fn aggregates_normalise_short_field_names_and_optional_fields() {
        let client = Arc::new(RecordingHttpClient::responding(200, AGGREGATES_BODY));
        let response =
            block_on(adapter(client).aggregates(query(Timeframe::OneMinute))).expect("ok");

        assert_eq!(response.symbol.as_str(), "AAPL");
        assert_eq!(response.request_id, "6a7e466379af0a71039d60cc78e72282");
        assert_eq!(response.result_count, 2);
        assert_eq!(response.bars[0].vwap, Some(180.12));
        assert_eq!(response.bars[0].transactions, Some(42));
        assert_eq!(response.bars[1].vwap, None);
        assert_eq!(response.bars[1].ts.format_chart_label(), "2023-06-01 13:31");
    }

    #[test]
    fn missing_results_yield_empty_series() {
        let body = r#"{"ticker":"AAPL","queryCount":0,"resultsCount":0,"adjusted":true,"status":"OK","request_id":"abc","count":0}"#;
        let client = Arc::new(RecordingHttpClient::responding(200, body));
        let response =
            block_on(adapter(client).aggregates(query(Timeframe::FiveMinutes))).expect("ok");
        assert!(response.is_empty());
        assert_eq!(response.timeframe, Timeframe::FiveMinutes);
    }

    #[test]
    fn non_success_status_surfaces_upstream_message() {
        let client = Arc::new(RecordingHttpClient::responding(
            403,
            r#"{"status":"NOT_AUTHORIZED","message":"You are not entitled to this data."}"#,
        ));
        let error =
            block_on(adapter(client).aggregates(query(Timeframe::OneMinute))).expect_err("fails");
        assert_eq!(error.kind(), FetchErrorKind::Status);
        assert_eq!(error.upstream_status(), Some(403));
        assert!(error.message().contains("not entitled"));
    }

    #[test]
    fn transport_failure_is_reported_once_without_retry() {
        let client = Arc::new(RecordingHttpClient::failure());
        let error = block_on(adapter(client.clone()).market_status()).expect_err("fails");
        assert_eq!(error.kind(), FetchErrorKind::Transport);
        assert_eq!(client.recorded_requests().len(), 1);
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let client = Arc::new(RecordingHttpClient::responding(200, STATUS_BODY));
        let adapter = PolygonAdapter::new(client.clone(), None);
        let error = block_on(adapter.market_status()).expect_err("fails");
        assert_eq!(error.kind(), FetchErrorKind::Configuration);
        assert!(client.recorded_requests().is_empty());
    }

    #[test]
    fn market_status_maps_states_and_normalises_server_time() {
        let client = Arc::new(RecordingHttpClient::responding(200, STATUS_BODY));
        let snapshot = block_on(adapter(client.clone()).market_status()).expect("ok");

        assert_eq!(snapshot.market, MarketState::Extended);
        assert_eq!(snapshot.exchange("otc"), Some(MarketState::Closed));
        assert_eq!(snapshot.currency("crypto"), Some(MarketState::Open));
        assert!(snapshot.after_hours);
        assert!(!snapshot.early_hours);
        assert_eq!(snapshot.server_time.format_rfc3339(), "2020-11-10T22:37:37Z");
        assert_eq!(
            client.recorded_requests()[0].url,
            "https://api.polygon.io/v1/marketstatus/now"
        );
    }

    #[test]
    fn malformed_bar_is_a_decode_error() {
        let body = r#"{"ticker":"AAPL","results":[{"v":1,"o":1,"c":1,"h":0.5,"l":2,"t":0}]}"#;
        let client = Arc::new(RecordingHttpClient::responding(200, body));
        let error =
            block_on(adapter(client).aggregates(query(Timeframe::OneMinute))).expect_err("fails");
        assert_eq!(error.kind(), FetchErrorKind::Decode);
    }

    fn block_on<F>(future: F) -> F::Output
    where
        F: Future,
    {
        let waker = noop_waker();
        let mut context = Context::from_waker(&waker);
        let mut future = std::pin::pin!(future);

        loop {
            match future.as_mut().poll(&mut context) {
                Poll::Ready(output) => return output,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    fn noop_waker() -> Waker {
        // SAFETY: The vtable functions never dereference the data pointer and are no-op operations.
        unsafe { Waker::from_raw(noop_raw_waker()) }
    }

    fn noop_raw_waker() -> RawWaker {
        RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
    }

    unsafe fn noop_raw_waker_clone(_: *const ()) -> RawWaker {
        noop_raw_waker()
    }

    unsafe fn noop_raw_waker_wake(_: *const ()) {}

    unsafe fn noop_raw_waker_wake_by_ref(_: *const ()) {}

    unsafe fn noop_raw_waker_drop(_: *const ()) {}

    static NOOP_RAW_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(
        noop_raw_waker_clone,
        noop_raw_waker_wake,
        noop_raw_waker_wake_by_ref,
        noop_raw_waker_drop,
    );
}
