//! Assets and their historical price records

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// A financial instrument identified by its ticker symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

impl Asset {
    /// Asset whose id and name both default to the symbol.
    #[must_use]
    pub fn from_symbol(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            id: symbol.clone(),
            name: symbol.clone(),
            symbol,
        }
    }
}

/// One OHLCV row for an asset on a trading day.
///
/// Only `adjusted_close` is consumed by the simulation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub date: Date,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub volume: i64,
    pub adjusted_close: f64,
}

impl PriceRecord {
    /// Record carrying only an adjusted close, other fields zeroed
    #[must_use]
    pub fn adjusted(symbol: impl Into<String>, date: Date, adjusted_close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            volume: 0,
            adjusted_close,
        }
    }

    /// Whether the record can take part in a log-return
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.adjusted_close > 0.0
    }
}
