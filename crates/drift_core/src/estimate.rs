//! Return-parameter estimation from historical prices
//!
//! Every model works from daily log-returns of the adjusted close. The
//! drift-diffusion model summarizes them into an annualized drift and
//! volatility; the resampling models keep the raw sample as a pool to draw
//! from.

use serde::{Deserialize, Serialize};

use crate::config::{SimulationModel, TRADING_DAYS_PER_YEAR};
use crate::error::EngineError;
use crate::model::PriceRecord;

/// Minimum number of usable records an asset needs before estimation
pub const MIN_USABLE_RECORDS: usize = 2;

/// Price history of one portfolio asset, ascending by date
#[derive(Debug, Clone, PartialEq)]
pub struct AssetHistory {
    pub symbol: String,
    pub records: Vec<PriceRecord>,
}

impl AssetHistory {
    pub fn new(symbol: impl Into<String>, records: Vec<PriceRecord>) -> Self {
        Self {
            symbol: symbol.into(),
            records,
        }
    }

    /// Records with a positive adjusted close
    #[must_use]
    pub fn usable_records(&self) -> usize {
        self.records.iter().filter(|r| r.is_usable()).count()
    }

    /// Fail with `InsufficientHistory` unless at least two records are usable.
    pub fn ensure_sufficient(&self) -> Result<(), EngineError> {
        let usable = self.usable_records();
        if usable < MIN_USABLE_RECORDS {
            return Err(EngineError::InsufficientHistory {
                symbol: self.symbol.clone(),
                usable,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn log_returns(&self) -> Vec<f64> {
        log_returns(&self.records)
    }
}

/// Daily log-returns `ln(close_i / close_{i-1})`, skipping any step where
/// either adjusted close is non-positive.
#[must_use]
pub fn log_returns(records: &[PriceRecord]) -> Vec<f64> {
    records
        .windows(2)
        .filter_map(|w| {
            let (prev, cur) = (w[0].adjusted_close, w[1].adjusted_close);
            (prev > 0.0 && cur > 0.0).then(|| (cur / prev).ln())
        })
        .collect()
}

/// Annualized drift and volatility of one asset
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiffusionParams {
    pub mu: f64,
    pub sigma: f64,
}

impl DiffusionParams {
    /// Estimate from a log-return sample. An empty sample yields zero drift
    /// and zero volatility.
    #[must_use]
    pub fn from_log_returns(returns: &[f64]) -> Self {
        let Some(summary) = ReturnSummary::from_returns(returns) else {
            return Self::default();
        };

        let days = TRADING_DAYS_PER_YEAR as f64;
        let (m, s) = (summary.mean, summary.std_dev);
        Self {
            mu: m * days + 0.5 * s * s * days,
            sigma: s * days.sqrt(),
        }
    }

    #[must_use]
    pub fn from_records(records: &[PriceRecord]) -> Self {
        Self::from_log_returns(&log_returns(records))
    }
}

/// Historical daily log-returns of one asset kept for resampling
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnPool {
    pub returns: Vec<f64>,
}

impl ReturnPool {
    #[must_use]
    pub fn new(returns: Vec<f64>) -> Self {
        Self { returns }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> Option<ReturnSummary> {
        ReturnSummary::from_returns(&self.returns)
    }
}

/// Descriptive statistics of a log-return sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ReturnSummary {
    #[must_use]
    pub fn from_returns(returns: &[f64]) -> Option<Self> {
        if returns.is_empty() {
            return None;
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            count: returns.len(),
            mean,
            std_dev: variance.sqrt(),
            min: returns.iter().copied().fold(f64::INFINITY, f64::min),
            max: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Per-asset parameters for the selected model, in portfolio order
#[derive(Debug, Clone, PartialEq)]
pub enum ModelParameters {
    Diffusion(Vec<DiffusionParams>),
    Resampling(Vec<ReturnPool>),
}

impl ModelParameters {
    #[must_use]
    pub fn num_assets(&self) -> usize {
        match self {
            ModelParameters::Diffusion(p) => p.len(),
            ModelParameters::Resampling(p) => p.len(),
        }
    }
}

/// Estimate model parameters for every asset.
///
/// Each history is checked for sufficient usable records before any
/// estimation is done.
pub fn estimate_parameters(
    model: SimulationModel,
    histories: &[AssetHistory],
) -> Result<ModelParameters, EngineError> {
    for history in histories {
        history.ensure_sufficient()?;
    }

    let params = match model {
        SimulationModel::DriftDiffusion => ModelParameters::Diffusion(
            histories
                .iter()
                .map(|h| {
                    let p = DiffusionParams::from_records(&h.records);
                    tracing::debug!(
                        symbol = %h.symbol,
                        mu = p.mu,
                        sigma = p.sigma,
                        "estimated drift-diffusion parameters"
                    );
                    p
                })
                .collect(),
        ),
        SimulationModel::Resampling | SimulationModel::BlockResampling => {
            ModelParameters::Resampling(
                histories
                    .iter()
                    .map(|h| {
                        let pool = ReturnPool::new(h.log_returns());
                        tracing::debug!(symbol = %h.symbol, samples = pool.len(), "built return pool");
                        pool
                    })
                    .collect(),
            )
        }
    };

    Ok(params)
}
