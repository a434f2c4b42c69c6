use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// Instant normalised to UTC.
///
/// Upstream payloads carry either epoch milliseconds (bars) or RFC3339 strings with a
/// local offset (market status `serverTime`); both end up here in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Parse an RFC3339 timestamp with any offset and convert it to UTC.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input.trim(), &Rfc3339).map_err(|_| {
            ValidationError::InvalidTimestamp {
                value: input.to_owned(),
            }
        })?;

        Ok(Self::from_offset_datetime(parsed))
    }

    pub fn from_unix_millis(millis: i64) -> Result<Self, ValidationError> {
        let nanos = i128::from(millis) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map(Self)
            .map_err(|_| ValidationError::TimestampOutOfRange { millis })
    }

    pub fn from_offset_datetime(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn unix_millis(self) -> i64 {
        (self.0.unix_timestamp_nanos() / 1_000_000) as i64
    }

    /// `YYYY-MM-DD HH:MM`, the label format used on chart axes and tooltips.
    pub fn format_chart_label(self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
        self.0
            .format(&format)
            .unwrap_or_else(|_| self.format_rfc3339())
    }

    /// `HH:MM:SS`, the clock shown next to the market status.
    pub fn format_clock(self) -> String {
        let format = format_description!("[hour]:[minute]:[second]");
        self.0
            .format(&format)
            .unwrap_or_else(|_| self.format_rfc3339())
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::from("<unformattable>"))
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
