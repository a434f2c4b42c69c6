//! # Sonar Web
//!
//! axum surface over `sonar-core` and `sonar-chat`.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/anthropic/chat` | Streamed analysis reply |
//! | `POST /api/openai/chat` | Streamed assistant reply |
//! | `POST /api/perplexity/chat` | Streamed search-grounded reply |
//! | `POST /api/openai/transcribe` | Multipart `audio` field to `{text}` |
//! | `GET /api/chart` | Validated bar fetch rendered as chart series |
//! | `GET /api/market-status` | Latest poller view |
//!
//! Failures are JSON `{error, code}`; see [`ApiError`].

pub mod error;
pub mod state;

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sonar_chat::{AudioPayload, ChatError, Message, ProviderKind};
use sonar_core::{
    parse_date, ChartQuery, ChartSeries, ChartSession, MarketStatusSnapshot, Timeframe, UtcDateTime,
};
use tower_http::cors::CorsLayer;

pub use error::ApiError;
pub use state::{AppState, ChatProviders};

/// Multipart field carrying the recording.
pub const AUDIO_FIELD: &str = "audio";

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/anthropic/chat", post(anthropic_chat))
        .route("/api/openai/chat", post(openai_chat))
        .route("/api/perplexity/chat", post(perplexity_chat))
        .route("/api/openai/transcribe", post(transcribe))
        .route("/api/chart", get(chart))
        .route("/api/market-status", get(market_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Chat

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

async fn anthropic_chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    stream_chat(&state, ProviderKind::Anthropic, request).await
}

async fn openai_chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    stream_chat(&state, ProviderKind::OpenAi, request).await
}

async fn perplexity_chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    stream_chat(&state, ProviderKind::Perplexity, request).await
}

/// The credential is checked before the body, so a missing key is reported
/// whatever was posted.
async fn stream_chat(
    state: &AppState,
    kind: ProviderKind,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let provider = state.chat.get(kind);
    if !provider.is_configured() {
        return Err(ChatError::Configuration {
            provider: kind.display_name(),
        }
        .into());
    }

    let Json(request) = request.map_err(|rejection| {
        log::debug!("{kind} chat body rejected: {rejection}");
        ApiError::from(rejection)
    })?;
    log::debug!("{kind} chat with {} messages", request.messages.len());
    let stream = provider.send(&request.messages).await.map_err(|error| {
        log::warn!("{kind} chat failed: {error}");
        ApiError::from(error)
    })?;

    let response = (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    );
    Ok(response.into_response())
}

// Transcription

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptBody {
    pub text: String,
}

async fn transcribe(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscriptBody>, ApiError> {
    let audio = match multipart {
        Ok(multipart) => read_audio(multipart).await?,
        Err(rejection) => {
            log::debug!("transcription request is not multipart: {rejection}");
            None
        }
    };

    let text = state.transcriber.transcribe(audio).await?;
    Ok(Json(TranscriptBody { text }))
}

async fn read_audio(mut multipart: Multipart) -> Result<Option<AudioPayload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::bad_request("request.multipart", error.body_text()))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("audio.webm").to_owned();
        let content_type = field.content_type().unwrap_or("audio/webm").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|error| ApiError::bad_request("request.multipart", error.body_text()))?;
        return Ok(Some(AudioPayload::new(file_name, content_type, bytes.to_vec())));
    }
    Ok(None)
}

// Market data

/// Query string of `GET /api/chart`. Everything is optional so that missing
/// values surface as `{error, code}` rather than a plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ChartParams {
    fn into_query(self) -> Result<ChartQuery, ApiError> {
        let symbol = self.symbol.ok_or_else(|| missing("symbol"))?;
        let timeframe = match self.timeframe.as_deref() {
            Some(value) => value.parse::<Timeframe>()?,
            None => Timeframe::OneMinute,
        };
        let start = parse_date(self.start.as_deref().ok_or_else(|| missing("start"))?)?;
        let end = parse_date(self.end.as_deref().ok_or_else(|| missing("end"))?)?;
        Ok(ChartQuery {
            symbol,
            timeframe,
            start,
            end,
        })
    }
}

fn missing(name: &str) -> ApiError {
    ApiError::bad_request("request.missing_parameter", format!("query parameter '{name}' is required"))
}

#[derive(Debug, Serialize)]
pub struct ChartBody {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// `None` when the provider returned no bars.
    pub chart: Option<ChartSeries>,
    pub axis_labels: Vec<String>,
}

async fn chart(State(state): State<AppState>, Query(params): Query<ChartParams>) -> Result<Json<ChartBody>, ApiError> {
    let query = params.into_query()?;
    let mut session = ChartSession::new();
    session.search(&state.fetcher, &query).await?;

    let chart = session.chart().cloned();
    let axis_labels = chart.as_ref().map(ChartSeries::axis_labels).unwrap_or_default();
    let symbol = session
        .response()
        .map(|response| response.symbol.to_string())
        .unwrap_or(query.symbol);
    Ok(Json(ChartBody {
        symbol,
        timeframe: query.timeframe,
        chart,
        axis_labels,
    }))
}

#[derive(Debug, Serialize)]
pub struct MarketStatusBody {
    pub snapshot: Option<MarketStatusSnapshot>,
    pub error: Option<String>,
    pub last_success: Option<UtcDateTime>,
    pub attempts: u64,
    /// Snapshot is the last good one and a newer poll failed.
    pub stale: bool,
}

async fn market_status(State(state): State<AppState>) -> Json<MarketStatusBody> {
    let view = state.market_status.borrow().clone();
    Json(MarketStatusBody {
        stale: view.is_stale(),
        snapshot: view.snapshot.as_deref().cloned(),
        error: view.error,
        last_success: view.last_success,
        attempts: view.attempts,
    })
}
