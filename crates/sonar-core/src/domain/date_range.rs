use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::macros::format_description;
use time::Date;

use crate::config::{MAX_DATE, MIN_DATE};
use crate::ValidationError;

/// Range violation reported by [`validate`].
///
/// Reasons are checked in declaration order and only the first one is reported.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Start date must be before end date")]
    StartAfterEnd,
    #[error("Start date cannot be before 2023")]
    StartTooEarly,
    #[error("End date cannot be after 2025")]
    EndTooLate,
}

impl DateRangeError {
    pub const fn code(self) -> &'static str {
        match self {
            Self::StartAfterEnd => "range.start_after_end",
            Self::StartTooEarly => "range.start_too_early",
            Self::EndTooLate => "range.end_too_late",
        }
    }
}

/// Check a `(start, end)` pair against `[MIN_DATE, MAX_DATE]`.
///
/// Equal dates are a valid single-day range.
pub fn validate(start: Date, end: Date) -> Result<(), DateRangeError> {
    if start > end {
        return Err(DateRangeError::StartAfterEnd);
    }
    if start < MIN_DATE {
        return Err(DateRangeError::StartTooEarly);
    }
    if end > MAX_DATE {
        return Err(DateRangeError::EndTooLate);
    }
    Ok(())
}

/// Parse an ISO 8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(input.trim(), &format).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

pub(crate) fn format_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
        .unwrap_or_else(|_| String::from("0000-00-00"))
}

/// Validated calendar range. Can only be built through [`DateRange::new`] or [`DateRange::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange", into = "RawDateRange")]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, DateRangeError> {
        validate(start, end)?;
        Ok(Self { start, end })
    }

    /// Parse and validate both ends.
    ///
    /// The outer error distinguishes unparseable input from a range violation.
    pub fn parse(start: &str, end: &str) -> Result<Result<Self, DateRangeError>, ValidationError> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        Ok(Self::new(start, end))
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    /// Replace the start date, revalidating the whole range.
    pub fn with_start(self, start: Date) -> Result<Self, DateRangeError> {
        Self::new(start, self.end)
    }

    /// Replace the end date, revalidating the whole range.
    pub fn with_end(self, end: Date) -> Result<Self, DateRangeError> {
        Self::new(self.start, end)
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", format_date(self.start), format_date(self.end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDateRange {
    start: String,
    end: String,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = String;

    fn try_from(value: RawDateRange) -> Result<Self, Self::Error> {
        match DateRange::parse(&value.start, &value.end) {
            Ok(Ok(range)) => Ok(range),
            Ok(Err(error)) => Err(error.to_string()),
            Err(error) => Err(error.to_string()),
        }
    }
}

impl From<DateRange> for RawDateRange {
    fn from(value: DateRange) -> Self {
        Self {
            start: format_date(value.start),
            end: format_date(value.end),
        }
    }
}
