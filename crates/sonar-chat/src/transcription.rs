//! One-shot audio-to-text through OpenAI's transcription endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use sonar_core::config::STREAM_HTTP_TIMEOUT_MS;
use sonar_core::{Credentials, HttpAuth, HttpClient, HttpRequest, MultipartPart, ReqwestHttpClient};

use crate::proxy::upstream_message;
use crate::TranscriptionError;

pub const OPENAI_TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";
/// Reported when the upstream error body carries no message.
pub const TRANSCRIPTION_FAILED_MESSAGE: &str = "Failed to transcribe audio";

/// Uploaded audio as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AudioPayload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

#[async_trait]
pub trait AudioTranscription: Send + Sync {
    /// Transcribe one payload into a single complete text. `None` or an empty
    /// payload is rejected with [`TranscriptionError::MissingAudio`].
    async fn transcribe(&self, audio: Option<AudioPayload>) -> Result<String, TranscriptionError>;
}

#[derive(Clone)]
pub struct Transcriber {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    endpoint: String,
}

impl Transcriber {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key,
            endpoint: String::from(OPENAI_TRANSCRIPTION_URL),
        }
    }

    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), credentials.openai.clone())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionPayload {
    text: String,
}

#[async_trait]
impl AudioTranscription for Transcriber {
    async fn transcribe(&self, audio: Option<AudioPayload>) -> Result<String, TranscriptionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TranscriptionError::Configuration)?;
        let audio = audio
            .filter(|audio| !audio.bytes.is_empty())
            .ok_or(TranscriptionError::MissingAudio)?;

        log::debug!(
            "transcribing {} ({} bytes)",
            audio.file_name,
            audio.bytes.len()
        );

        let request = HttpRequest::post(self.endpoint.clone())
            .with_timeout_ms(STREAM_HTTP_TIMEOUT_MS)
            .with_auth(&HttpAuth::BearerToken(api_key.to_owned()))
            .with_multipart(vec![
                MultipartPart::File {
                    name: String::from("file"),
                    file_name: audio.file_name,
                    content_type: audio.content_type,
                    bytes: audio.bytes,
                },
                MultipartPart::Text {
                    name: String::from("model"),
                    value: String::from(TRANSCRIPTION_MODEL),
                },
            ]);

        let response = self.http_client.execute(request).await.map_err(|error| {
            log::warn!("transcription transport failure: {error}");
            TranscriptionError::Transport {
                message: error.message().to_owned(),
            }
        })?;

        if !response.is_success() {
            let message = upstream_message(&response.body)
                .unwrap_or_else(|| String::from(TRANSCRIPTION_FAILED_MESSAGE));
            log::warn!("transcription rejected with status {}: {message}", response.status);
            return Err(TranscriptionError::Upstream {
                status: response.status,
                message,
            });
        }

        serde_json::from_str::<TranscriptionPayload>(&response.body)
            .map(|payload| payload.text)
            .map_err(|error| TranscriptionError::Decode {
                message: error.to_string(),
            })
    }
}
