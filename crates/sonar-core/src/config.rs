//! Fixed constants and environment-supplied credentials.
//!
//! Date bounds, the poll cadence and the axis label cap are compile-time constants.
//! Credentials are read from the environment only and never logged.

use std::time::Duration;

use time::macros::date;
use time::Date;

/// Earliest selectable start date.
pub const MIN_DATE: Date = date!(2023 - 01 - 01);

/// Latest selectable end date.
pub const MAX_DATE: Date = date!(2025 - 12 - 31);

/// Day queried for granularities coarser than one minute under
/// [`QueryWindowPolicy::PinnedDay`](crate::QueryWindowPolicy::PinnedDay).
pub const LEGACY_PINNED_DAY: Date = date!(2023 - 02 - 18);

/// Market status refresh cadence.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Maximum number of tick labels shown on the time axis.
pub const AXIS_LABEL_CAP: usize = 8;

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 3_000;
pub const STREAM_HTTP_TIMEOUT_MS: u64 = 120_000;

pub const POLYGON_API_KEY_ENV: &str = "POLYGON_API_KEY";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const PERPLEXITY_API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Provider secrets. Empty or whitespace-only values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub polygon: Option<String>,
    pub anthropic: Option<String>,
    pub openai: Option<String>,
    pub perplexity: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            polygon: read_secret(POLYGON_API_KEY_ENV),
            anthropic: read_secret(ANTHROPIC_API_KEY_ENV),
            openai: read_secret(OPENAI_API_KEY_ENV),
            perplexity: read_secret(PERPLEXITY_API_KEY_ENV),
        }
    }
}

// Keeps secrets out of `{:?}` output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("polygon", &self.polygon.as_ref().map(|_| "<set>"))
            .field("anthropic", &self.anthropic.as_ref().map(|_| "<set>"))
            .field("openai", &self.openai.as_ref().map(|_| "<set>"))
            .field("perplexity", &self.perplexity.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Read one secret from the environment.
pub fn read_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(non_blank)
}

/// Normalise an optional secret: blank strings become `None`.
pub fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_secrets_count_as_absent() {
        assert_eq!(non_blank(String::from("   ")), None);
        assert_eq!(non_blank(String::new()), None);
        assert_eq!(non_blank(String::from(" key ")), Some(String::from("key")));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credentials = Credentials {
            openai: Some(String::from("sk-secret")),
            ..Credentials::default()
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<set>"));
    }

    #[test]
    fn bounds_are_ordered() {
        assert!(MIN_DATE < LEGACY_PINNED_DAY);
        assert!(LEGACY_PINNED_DAY < MAX_DATE);
    }
}
