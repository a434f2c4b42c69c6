use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Bar granularity offered to the user. Every variant is an intraday minute bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1")]
    OneMinute,
    #[serde(rename = "5")]
    FiveMinutes,
    #[serde(rename = "15")]
    FifteenMinutes,
    #[serde(rename = "30")]
    ThirtyMinutes,
    #[serde(rename = "60")]
    SixtyMinutes,
}

impl Timeframe {
    pub const ALL: [Self; 5] = [
        Self::OneMinute,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::SixtyMinutes,
    ];

    /// Bucket width in minutes, used as the aggregate multiplier upstream.
    pub const fn minutes(self) -> u32 {
        match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::SixtyMinutes => 60,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1",
            Self::FiveMinutes => "5",
            Self::FifteenMinutes => "15",
            Self::ThirtyMinutes => "30",
            Self::SixtyMinutes => "60",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OneMinute => "1 Minute",
            Self::FiveMinutes => "5 Minutes",
            Self::FifteenMinutes => "15 Minutes",
            Self::ThirtyMinutes => "30 Minutes",
            Self::SixtyMinutes => "1 Hour",
        }
    }

    pub const fn is_finest(self) -> bool {
        matches!(self, Self::OneMinute)
    }
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ValidationError;

    /// Accepts bare minute counts (`"15"`) as well as `"15m"` and `"1h"`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "1m" => Ok(Self::OneMinute),
            "5" | "5m" => Ok(Self::FiveMinutes),
            "15" | "15m" => Ok(Self::FifteenMinutes),
            "30" | "30m" => Ok(Self::ThirtyMinutes),
            "60" | "60m" | "1h" => Ok(Self::SixtyMinutes),
            other => Err(ValidationError::InvalidTimeframe {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minute_counts_and_suffixed_forms() {
        assert_eq!(Timeframe::from_str("30").expect("must parse"), Timeframe::ThirtyMinutes);
        assert_eq!(Timeframe::from_str("1h").expect("must parse"), Timeframe::SixtyMinutes);
        assert_eq!(Timeframe::from_str(" 5M ").expect("must parse"), Timeframe::FiveMinutes);
    }

    #[test]
    fn rejects_granularity_outside_the_fixed_set() {
        let err = Timeframe::from_str("2").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTimeframe { .. }));
    }

    #[test]
    fn minutes_round_trip_through_display() {
        for timeframe in Timeframe::ALL {
            let parsed = Timeframe::from_str(&timeframe.to_string()).expect("must parse");
            assert_eq!(parsed, timeframe);
            assert_eq!(parsed.as_str(), timeframe.minutes().to_string());
        }
    }
}
