//! Aggregated statistics over a completed path set

use serde::{Deserialize, Serialize};

/// Percentile, dispersion, loss and drawdown statistics for one run.
///
/// The `Default` value (all zeros) is what an empty path set produces and what
/// an unfinished or failed run carries.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultStats {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub mean: f64,
    /// Population standard deviation of terminal values
    pub std_dev: f64,
    /// Fraction of paths ending strictly below the starting value
    pub probability_of_loss: f64,
    pub median_max_drawdown: f64,
    pub p95_max_drawdown: f64,
    pub median_cagr: f64,
}

impl ResultStats {
    /// Terminal value percentiles as `(percentile, value)` pairs
    #[must_use]
    pub fn percentile_values(&self) -> [(f64, f64); 5] {
        [
            (0.05, self.p5),
            (0.25, self.p25),
            (0.50, self.p50),
            (0.75, self.p75),
            (0.95, self.p95),
        ]
    }
}
