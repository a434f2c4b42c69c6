use sonar_chat::{ChatError, TranscriptionError};
use sonar_core::{CoreError, DateRangeError, FetchError, FetchErrorKind, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::DateRange(_) => 2,
            Self::Command(_) => 2,
            Self::Fetch(error) => match error.kind() {
                FetchErrorKind::Configuration => 7,
                _ => 3,
            },
            Self::Chat(error) => {
                if error.is_configuration() {
                    7
                } else {
                    6
                }
            }
            Self::Transcription(TranscriptionError::Configuration) => 7,
            Self::Transcription(TranscriptionError::MissingAudio) => 2,
            Self::Transcription(_) => 6,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::DateRange(error) => Self::DateRange(error),
            CoreError::Fetch(error) => Self::Fetch(error),
            CoreError::Serialization(error) => Self::Serialization(error),
        }
    }
}
