//! Per-provider configuration as data.
//!
//! The three chat variants differ only in the values held by a [`ProviderProfile`]:
//! endpoint, model, sampling settings, credential variable, persona and wire dialect.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sonar_core::config::{
    ANTHROPIC_API_KEY_ENV, OPENAI_API_KEY_ENV, PERPLEXITY_API_KEY_ENV, STREAM_HTTP_TIMEOUT_MS,
};
use sonar_core::{Credentials, HttpAuth, HttpRequest};

use crate::persona::{ANALYST_PERSONA, ASSISTANT_PERSONA, SEARCH_PERSONA};
use crate::{ChatError, Message, Role};

pub const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const PERPLEXITY_CHAT_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Chat provider variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Analysis persona.
    Anthropic,
    /// General assistant persona.
    OpenAi,
    /// Search-augmented persona.
    Perplexity,
}

impl ProviderKind {
    pub const ALL: [Self; 3] = [Self::Anthropic, Self::OpenAi, Self::Perplexity];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Perplexity => "perplexity",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::OpenAi => "OpenAI",
            Self::Perplexity => "Perplexity",
        }
    }

    /// Pick this provider's key out of a credential set.
    pub fn credential(self, credentials: &Credentials) -> Option<String> {
        match self {
            Self::Anthropic => credentials.anthropic.clone(),
            Self::OpenAi => credentials.openai.clone(),
            Self::Perplexity => credentials.perplexity.clone(),
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "perplexity" => Ok(Self::Perplexity),
            other => Err(format!(
                "unknown chat provider '{other}', expected anthropic, openai or perplexity"
            )),
        }
    }
}

/// Request/stream shape spoken by an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireDialect {
    /// Anthropic Messages API: `system` field, `content_block_delta` events.
    AnthropicMessages,
    /// OpenAI-compatible chat completions: system message first, `choices[].delta` events.
    ChatCompletions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub endpoint: String,
    pub model: &'static str,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub credential_env: &'static str,
    pub persona: &'static str,
    pub dialect: WireDialect,
}

impl ProviderProfile {
    pub fn for_kind(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Anthropic => Self {
                kind,
                endpoint: String::from(ANTHROPIC_MESSAGES_URL),
                model: "claude-3-5-sonnet-latest",
                temperature: 0.7,
                max_tokens: Some(1000),
                credential_env: ANTHROPIC_API_KEY_ENV,
                persona: ANALYST_PERSONA,
                dialect: WireDialect::AnthropicMessages,
            },
            ProviderKind::OpenAi => Self {
                kind,
                endpoint: String::from(OPENAI_CHAT_URL),
                model: "gpt-3.5-turbo",
                temperature: 0.7,
                max_tokens: Some(500),
                credential_env: OPENAI_API_KEY_ENV,
                persona: ASSISTANT_PERSONA,
                dialect: WireDialect::ChatCompletions,
            },
            ProviderKind::Perplexity => Self {
                kind,
                endpoint: String::from(PERPLEXITY_CHAT_URL),
                model: "sonar-pro",
                temperature: 0.7,
                max_tokens: None,
                credential_env: PERPLEXITY_API_KEY_ENV,
                persona: SEARCH_PERSONA,
                dialect: WireDialect::ChatCompletions,
            },
        }
    }

    pub const fn display_name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// Persona system message followed by the caller's history, in order.
    pub fn dispatch_messages(&self, history: &[Message]) -> Vec<WireMessage> {
        std::iter::once(WireMessage {
            role: Role::System,
            content: self.persona.to_owned(),
        })
        .chain(history.iter().map(WireMessage::from))
        .collect()
    }

    /// Build the streaming upstream request for `history`.
    pub fn build_request(&self, api_key: &str, history: &[Message]) -> Result<HttpRequest, ChatError> {
        let body = self.request_body(history);
        let request = HttpRequest::post(self.endpoint.clone())
            .with_timeout_ms(STREAM_HTTP_TIMEOUT_MS)
            .with_header("accept", "text/event-stream");

        let request = match self.dialect {
            WireDialect::AnthropicMessages => request
                .with_auth(&HttpAuth::Header {
                    name: String::from("x-api-key"),
                    value: api_key.to_owned(),
                })
                .with_header("anthropic-version", ANTHROPIC_VERSION),
            WireDialect::ChatCompletions => {
                request.with_auth(&HttpAuth::BearerToken(api_key.to_owned()))
            }
        };

        request.with_json(&body).map_err(|error| ChatError::Decode {
            provider: self.display_name(),
            message: error.to_string(),
        })
    }

    fn request_body(&self, history: &[Message]) -> Value {
        let mut body = match self.dialect {
            WireDialect::ChatCompletions => json!({
                "model": self.model,
                "messages": self.dispatch_messages(history),
                "temperature": self.temperature,
                "stream": true,
            }),
            WireDialect::AnthropicMessages => {
                // The Messages API takes system text out of band and rejects a system role.
                let mut system = String::from(self.persona);
                let mut turns = Vec::with_capacity(history.len());
                for message in history {
                    match message.role {
                        Role::System => {
                            system.push_str("\n\n");
                            system.push_str(&message.content);
                        }
                        _ => turns.push(WireMessage::from(message)),
                    }
                }
                json!({
                    "model": self.model,
                    "system": system,
                    "messages": turns,
                    "temperature": self.temperature,
                    "stream": true,
                })
            }
        };

        if let (Some(max_tokens), Some(object)) = (self.max_tokens, body.as_object_mut()) {
            object.insert(String::from("max_tokens"), json!(max_tokens));
        }
        body
    }
}

/// Message as sent upstream: role and content only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}
