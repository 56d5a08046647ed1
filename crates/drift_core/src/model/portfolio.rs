use serde::{Deserialize, Serialize};

/// A symbol and its fractional weight in a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAsset {
    pub symbol: String,
    pub weight: f64,
}

impl PortfolioAsset {
    pub fn new(symbol: impl Into<String>, weight: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
        }
    }
}

/// How often the portfolio would be rebalanced.
///
/// Recorded with the experiment; path generation does not rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceFrequency {
    #[default]
    None,
    Monthly,
    Quarterly,
    Annual,
}

/// An ordered set of weighted assets simulated together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub assets: Vec<PortfolioAsset>,
    #[serde(default)]
    pub rebalance: RebalanceFrequency,
}

impl Portfolio {
    /// Sum of all asset weights. Expected, not enforced, to be 1.0.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.assets.iter().map(|a| a.weight).sum()
    }

    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        self.assets.iter().map(|a| a.weight).collect()
    }
}
