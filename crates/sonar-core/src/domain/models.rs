use serde::{Deserialize, Serialize};

use crate::{Symbol, Timeframe, UtcDateTime, ValidationError};

/// OHLCV bar for one time bucket, as received from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub vwap: Option<f64>,
    pub transactions: Option<u64>,
}

impl Bar {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        vwap: Option<f64>,
        transactions: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;
        validate_non_negative("volume", volume)?;
        validate_optional_non_negative("vwap", vwap)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
            vwap,
            transactions,
        })
    }
}

/// One normalised aggregates response.
///
/// Bars keep the order the provider returned them in; nothing re-sorts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub bars: Vec<Bar>,
    pub request_id: String,
    pub result_count: usize,
    pub adjusted: bool,
    pub status: String,
}

impl SeriesResponse {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// True when every timestamp is >= its predecessor.
    pub fn is_ascending(&self) -> bool {
        self.bars.windows(2).all(|pair| pair[0].ts <= pair[1].ts)
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(millis: i64) -> UtcDateTime {
        UtcDateTime::from_unix_millis(millis).expect("in range")
    }

    #[test]
    fn rejects_inverted_bar_range() {
        let err = Bar::new(ts(0), 10.0, 9.0, 12.0, 10.0, 100.0, None, None).expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidBarRange);
    }

    #[test]
    fn rejects_non_finite_prices() {
        let err =
            Bar::new(ts(0), f64::NAN, 12.0, 9.0, 10.0, 100.0, None, None).expect_err("must fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { field: "open" }));
    }

    #[test]
    fn ascending_check_reports_provider_order() {
        let bar = |millis| Bar::new(ts(millis), 1.0, 2.0, 0.5, 1.5, 10.0, None, None).expect("valid");
        let mut response = SeriesResponse {
            symbol: Symbol::parse("AAPL").expect("valid symbol"),
            timeframe: Timeframe::OneMinute,
            bars: vec![bar(1_000), bar(2_000)],
            request_id: String::from("req"),
            result_count: 2,
            adjusted: true,
            status: String::from("OK"),
        };
        assert!(response.is_ascending());

        response.bars.reverse();
        assert!(!response.is_ascending());
    }
}
