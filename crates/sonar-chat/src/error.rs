use thiserror::Error;

/// Chat dispatch and streaming failures.
///
/// `provider` is the display name of the upstream, e.g. `"Anthropic"`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Credential missing. Raised before any network call.
    #[error("{provider} API key is not configured")]
    Configuration { provider: &'static str },

    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned status {status}: {message}")]
    Upstream {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The response started streaming and then broke off.
    #[error("{provider} stream failed: {message}")]
    Stream {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
}

impl ChatError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "chat.configuration",
            Self::Transport { .. } => "chat.transport",
            Self::Upstream { .. } => "chat.upstream",
            Self::Stream { .. } => "chat.stream",
            Self::Decode { .. } => "chat.decode",
        }
    }

    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Audio transcription failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("OpenAI API key is not configured")]
    Configuration,

    #[error("No audio file provided")]
    MissingAudio,

    #[error("transcription request failed: {message}")]
    Transport { message: String },

    #[error("transcription upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("transcription response could not be decoded: {message}")]
    Decode { message: String },
}

impl TranscriptionError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Configuration => "transcription.configuration",
            Self::MissingAudio => "transcription.missing_audio",
            Self::Transport { .. } => "transcription.transport",
            Self::Upstream { .. } => "transcription.upstream",
            Self::Decode { .. } => "transcription.decode",
        }
    }
}
