use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// Trading state of a market, exchange or currency venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketState {
    Open,
    Closed,
    Extended,
}

impl MarketState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Extended => "extended",
        }
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl Display for MarketState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketState {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "extended" | "extended-hours" | "early-hours" | "after-hours" => Ok(Self::Extended),
            other => Err(ValidationError::InvalidMarketState {
                value: other.to_owned(),
            }),
        }
    }
}

/// Full-replace read of current market status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatusSnapshot {
    pub market: MarketState,
    /// Exchange name (`nyse`, `nasdaq`, `otc`) to state.
    pub exchanges: BTreeMap<String, MarketState>,
    /// Currency venue (`fx`, `crypto`) to state.
    pub currencies: BTreeMap<String, MarketState>,
    pub after_hours: bool,
    pub early_hours: bool,
    pub server_time: UtcDateTime,
}

impl MarketStatusSnapshot {
    pub fn exchange(&self, name: &str) -> Option<MarketState> {
        self.exchanges.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn currency(&self, name: &str) -> Option<MarketState> {
        self.currencies.get(&name.to_ascii_lowercase()).copied()
    }
}
