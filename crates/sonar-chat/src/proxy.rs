//! Streaming chat dispatch to one upstream provider.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use sonar_core::{ByteStream, Credentials, HttpClient, ReqwestHttpClient};

use crate::provider::{ProviderKind, ProviderProfile, WireDialect};
use crate::sse::{SseDecoder, SseEvent, SseSignal};
use crate::stream::{ChatStream, ChunkSender};
use crate::{ChatError, Message};

/// Common capability of every chat variant.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether the provider credential is present. `send` fails without it.
    fn is_configured(&self) -> bool;

    /// Dispatch `history` behind the provider persona and return the reply stream.
    ///
    /// Fails with [`ChatError::Configuration`] before any network call when the
    /// credential is missing.
    async fn send(&self, history: &[Message]) -> Result<ChatStream, ChatError>;
}

/// [`ChatProvider`] backed by an HTTP streaming endpoint.
#[derive(Clone)]
pub struct ChatStreamProxy {
    profile: ProviderProfile,
    api_key: Option<String>,
    http_client: Arc<dyn HttpClient>,
}

impl ChatStreamProxy {
    pub fn new(kind: ProviderKind, http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            profile: ProviderProfile::for_kind(kind),
            api_key,
            http_client,
        }
    }

    /// Real transport with the provider key taken from `credentials`.
    pub fn from_credentials(kind: ProviderKind, credentials: &Credentials) -> Self {
        Self::new(
            kind,
            Arc::new(ReqwestHttpClient::new()),
            kind.credential(credentials),
        )
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.profile.endpoint = endpoint.into();
        self
    }

    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }
}

#[async_trait]
impl ChatProvider for ChatStreamProxy {
    fn kind(&self) -> ProviderKind {
        self.profile.kind
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, history: &[Message]) -> Result<ChatStream, ChatError> {
        let provider = self.profile.display_name();
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ChatError::Configuration { provider })?;

        let request = self.profile.build_request(api_key, history)?;
        log::debug!(
            "dispatching {} chat with {} messages",
            self.profile.kind,
            history.len()
        );

        let response = self
            .http_client
            .execute_stream(request)
            .await
            .map_err(|error| {
                log::warn!("{provider} chat transport failure: {error}");
                ChatError::Transport {
                    provider,
                    message: error.message().to_owned(),
                }
            })?;

        if !response.is_success() {
            let status = response.status;
            let body = response.into_text().await.unwrap_or_default();
            let message = upstream_message(&body).unwrap_or_else(|| format!("status {status}"));
            log::warn!("{provider} chat rejected with status {status}: {message}");
            return Err(ChatError::Upstream {
                provider,
                status,
                message,
            });
        }

        let dialect = self.profile.dialect;
        Ok(ChatStream::spawn(move |sender| {
            pump(response.body, dialect, provider, sender)
        }))
    }
}

/// Decode the upstream byte stream and forward text chunks until done, failed or
/// the consumer goes away.
async fn pump(mut body: ByteStream, dialect: WireDialect, provider: &'static str, sender: ChunkSender) {
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(error) => {
                log::warn!("{provider} chat stream interrupted: {error}");
                let _ = sender
                    .send(Err(ChatError::Stream {
                        provider,
                        message: error.message().to_owned(),
                    }))
                    .await;
                return;
            }
        };

        for event in decoder.push(&bytes) {
            match forward(&event, dialect, provider, &sender).await {
                Flow::Continue => {}
                Flow::Stop => return,
            }
        }
    }

    if let Some(event) = decoder.finish() {
        let _ = forward(&event, dialect, provider, &sender).await;
    }
}

enum Flow {
    Continue,
    Stop,
}

async fn forward(event: &SseEvent, dialect: WireDialect, provider: &'static str, sender: &ChunkSender) -> Flow {
    let item = match dialect.interpret(event) {
        Ok(SseSignal::Text(text)) => Ok(text),
        Ok(SseSignal::Ignore) => return Flow::Continue,
        Ok(SseSignal::Done) => return Flow::Stop,
        Ok(SseSignal::Error(message)) => Err(ChatError::Stream { provider, message }),
        Err(error) => Err(ChatError::Decode {
            provider,
            message: error.to_string(),
        }),
    };

    let failed = item.is_err();
    if sender.send(item).await.is_err() {
        log::debug!("{provider} chat consumer went away, stopping stream");
        return Flow::Stop;
    }
    if failed {
        Flow::Stop
    } else {
        Flow::Continue
    }
}

/// Pull a human-readable message out of an upstream error body.
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Envelope {
        error: ErrorField,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorField {
        Text(String),
        Object { message: String },
    }

    let envelope = serde_json::from_str::<Envelope>(body).ok()?;
    Some(match envelope.error {
        ErrorField::Text(message) | ErrorField::Object { message } => message,
    })
}
