//! Simulation configuration
//!
//! `SimulationConfig` holds every parameter of a single simulation run. It is
//! validated by the engine before estimation begins and is never silently
//! corrected: defaults belong to whatever layer builds the config (see
//! [`experiment_file`] for the JSON loader's defaults).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub mod experiment_file;

pub use experiment_file::{ExperimentFile, parse_experiment_json};

/// Trading days per year, used for annualization and cash-flow timing
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Block length used by block resampling when none is configured
/// (roughly one trading month)
pub const DEFAULT_BLOCK_DAYS: usize = 21;

/// Stochastic model used to generate paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimulationModel {
    /// Geometric Brownian motion with drift and volatility estimated per asset
    #[default]
    #[serde(rename = "gbm")]
    DriftDiffusion,
    /// i.i.d. bootstrap of historical daily log-returns
    #[serde(rename = "bootstrap")]
    Resampling,
    /// Circular block bootstrap of historical daily log-returns
    #[serde(rename = "block_bootstrap")]
    BlockResampling,
}

impl SimulationModel {
    pub const ALL: [SimulationModel; 3] = [
        SimulationModel::DriftDiffusion,
        SimulationModel::Resampling,
        SimulationModel::BlockResampling,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SimulationModel::DriftDiffusion => "gbm",
            SimulationModel::Resampling => "bootstrap",
            SimulationModel::BlockResampling => "block_bootstrap",
        }
    }
}

impl fmt::Display for SimulationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationModel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| EngineError::UnknownModel(s.to_string()))
    }
}

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub model: SimulationModel,
    pub num_paths: usize,
    /// Simulated trading days per path
    pub horizon_days: usize,
    /// Trading days of price history used for estimation
    pub lookback_days: usize,
    pub start_value: f64,
    /// `None` runs in non-deterministic mode (seeded from the clock).
    /// Negative seeds are accepted and reinterpreted as their `u64` bits.
    #[serde(default)]
    pub seed: Option<i64>,
    /// Cash added at every 252-day boundary; 0 disables
    #[serde(default)]
    pub annual_contribution: f64,
    /// Fraction of value withdrawn at every 252-day boundary; 0 disables
    #[serde(default)]
    pub withdrawal_rate: f64,
    /// Block length for block resampling, [`DEFAULT_BLOCK_DAYS`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_days: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            model: SimulationModel::DriftDiffusion,
            num_paths: 1_000,
            horizon_days: TRADING_DAYS_PER_YEAR,
            lookback_days: 3 * TRADING_DAYS_PER_YEAR,
            start_value: 100_000.0,
            seed: None,
            annual_contribution: 0.0,
            withdrawal_rate: 0.0,
            block_days: None,
        }
    }
}

impl SimulationConfig {
    /// Check every constraint, reporting the first violation.
    pub fn validate(&self) -> Result<(), EngineError> {
        let fail = |msg: &str| Err(EngineError::Validation(msg.to_string()));

        if self.num_paths == 0 {
            return fail("num_paths must be positive");
        }
        if self.horizon_days == 0 {
            return fail("horizon_days must be positive");
        }
        if self.lookback_days == 0 {
            return fail("lookback_days must be positive");
        }
        // Written as a negated comparison so NaN is rejected too
        if !(self.start_value > 0.0) || !self.start_value.is_finite() {
            return fail("start_value must be positive");
        }
        if !self.annual_contribution.is_finite() {
            return fail("annual_contribution must be finite");
        }
        if self.block_days == Some(0) {
            return fail("block_days must be positive");
        }
        Ok(())
    }

    /// Horizon expressed in years of trading days
    #[must_use]
    pub fn horizon_years(&self) -> f64 {
        self.horizon_days as f64 / TRADING_DAYS_PER_YEAR as f64
    }

    #[must_use]
    pub fn effective_block_days(&self) -> usize {
        self.block_days.unwrap_or(DEFAULT_BLOCK_DAYS)
    }

    /// Number of price records requested per asset: one more than the
    /// lookback so it yields `lookback_days` returns.
    #[must_use]
    pub fn price_limit(&self) -> usize {
        self.lookback_days + 1
    }
}
