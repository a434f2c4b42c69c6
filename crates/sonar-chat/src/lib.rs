//! # Sonar Chat
//!
//! One streaming chat capability over three providers, plus audio transcription.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`conversation`] | Drives a [`ConversationState`] through one provider |
//! | [`error`] | [`ChatError`] and [`TranscriptionError`] |
//! | [`message`] | Roles, messages and the append-only conversation state |
//! | [`persona`] | System prompts, one per provider |
//! | [`provider`] | Provider variants and their configuration profiles |
//! | [`proxy`] | [`ChatProvider`] trait and the HTTP-backed [`ChatStreamProxy`] |
//! | [`sse`] | Server-sent event decoding for both wire dialects |
//! | [`stream`] | Cancellable reply stream |
//! | [`transcription`] | Audio to text |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sonar_chat::{ChatStreamProxy, Conversation, ProviderKind};
//! use sonar_core::Credentials;
//!
//! let proxy = ChatStreamProxy::from_credentials(ProviderKind::Perplexity, &Credentials::from_env());
//! let mut conversation = Conversation::new(Arc::new(proxy));
//! conversation.submit_with("Explain RSI", |chunk| print!("{chunk}")).await?;
//! ```

pub mod conversation;
pub mod error;
pub mod message;
pub mod persona;
pub mod provider;
pub mod proxy;
pub mod sse;
pub mod stream;
pub mod transcription;

pub use conversation::Conversation;
pub use error::{ChatError, TranscriptionError};
pub use message::{ConversationState, Message, Role, FAILED_RESPONSE_MESSAGE};
pub use provider::{ProviderKind, ProviderProfile, WireDialect, WireMessage};
pub use proxy::{ChatProvider, ChatStreamProxy};
pub use sse::{SseDecoder, SseEvent, SseSignal};
pub use stream::{ChatStream, ChunkResult, ChunkSender, StreamState};
pub use transcription::{AudioPayload, AudioTranscription, Transcriber};
