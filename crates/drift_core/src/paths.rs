//! Path generation
//!
//! A [`PathGenerator`] turns estimated parameters into one simulated
//! portfolio-value trajectory per call. Every model steps day by day over the
//! horizon with `dt = 1/252` and adds the annual contribution at each
//! multiple of 252 days, after that day's valuation.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::config::{SimulationConfig, SimulationModel, TRADING_DAYS_PER_YEAR};
use crate::error::EngineError;
use crate::estimate::{DiffusionParams, ModelParameters, ReturnPool};
use crate::model::SimulatedPath;

/// Fixed contribution added on year boundaries.
///
/// The configured withdrawal rate is recorded with the experiment but never
/// applied to paths.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CashFlows {
    pub annual_contribution: f64,
}

impl CashFlows {
    #[must_use]
    pub fn is_flow_day(&self, day: usize) -> bool {
        self.annual_contribution != 0.0 && day % TRADING_DAYS_PER_YEAR == 0
    }

    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        value + self.annual_contribution
    }
}

/// Horizon, starting value and cash flows shared by every model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSettings {
    pub horizon_days: usize,
    pub start_value: f64,
    pub cash_flows: CashFlows,
}

impl From<&SimulationConfig> for PathSettings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            horizon_days: config.horizon_days,
            start_value: config.start_value,
            cash_flows: CashFlows {
                annual_contribution: config.annual_contribution,
            },
        }
    }
}

impl PathSettings {
    fn new_values(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.horizon_days + 1);
        values.push(self.start_value);
        values
    }
}

/// Per-asset increments of the discretized geometric Brownian motion
#[derive(Debug, Clone, Copy, PartialEq)]
struct DiffusionStep {
    /// `(mu - sigma²/2)·dt`
    drift: f64,
    /// `sigma·sqrt(dt)`
    shock: f64,
}

impl DiffusionStep {
    fn new(params: DiffusionParams) -> Self {
        let dt = 1.0 / TRADING_DAYS_PER_YEAR as f64;
        Self {
            drift: (params.mu - 0.5 * params.sigma * params.sigma) * dt,
            shock: params.sigma * dt.sqrt(),
        }
    }
}

/// Independent geometric Brownian motion per asset.
///
/// Shocks are not correlated across assets. Each day's value is the starting
/// value scaled by the weighted growth factors, so a contribution shows up on
/// its flow day only and is not carried into later days.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionGenerator {
    settings: PathSettings,
    steps: Vec<DiffusionStep>,
    weights: Vec<f64>,
}

impl DiffusionGenerator {
    #[must_use]
    pub fn new(settings: PathSettings, params: &[DiffusionParams], weights: &[f64]) -> Self {
        Self {
            settings,
            steps: params.iter().copied().map(DiffusionStep::new).collect(),
            weights: weights.to_vec(),
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulatedPath {
        let settings = &self.settings;
        let mut values = settings.new_values();
        let mut growth = vec![1.0; self.steps.len()];

        for day in 1..=settings.horizon_days {
            for (g, step) in growth.iter_mut().zip(&self.steps) {
                let z: f64 = StandardNormal.sample(rng);
                *g *= (step.drift + step.shock * z).exp();
            }
            let mix: f64 = growth.iter().zip(&self.weights).map(|(g, w)| g * w).sum();

            let mut value = settings.start_value * mix;
            if settings.cash_flows.is_flow_day(day) {
                value = settings.cash_flows.apply(value);
            }
            values.push(value);
        }

        SimulatedPath::new(values)
    }
}

/// i.i.d. bootstrap of historical daily log-returns
#[derive(Debug, Clone, PartialEq)]
pub struct ResamplingGenerator {
    settings: PathSettings,
    pools: Vec<ReturnPool>,
    weights: Vec<f64>,
}

impl ResamplingGenerator {
    #[must_use]
    pub fn new(settings: PathSettings, pools: Vec<ReturnPool>, weights: &[f64]) -> Self {
        Self {
            settings,
            pools,
            weights: weights.to_vec(),
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulatedPath {
        let settings = &self.settings;
        let mut values = settings.new_values();
        let mut value = settings.start_value;

        for day in 1..=settings.horizon_days {
            let mut log_return = 0.0;
            for (pool, w) in self.pools.iter().zip(&self.weights) {
                // Assets without history contribute nothing
                if !pool.is_empty() {
                    log_return += w * pool.returns[rng.random_range(0..pool.len())];
                }
            }

            value *= log_return.exp();
            if settings.cash_flows.is_flow_day(day) {
                value = settings.cash_flows.apply(value);
            }
            values.push(value);
        }

        SimulatedPath::new(values)
    }
}

/// Circular block bootstrap of historical daily log-returns.
///
/// Blocks of `block_days` consecutive observations start at a uniformly drawn
/// offset and wrap around the end of the sample. The offset is shared by all
/// assets (modulo each pool's length) so returns observed on the same
/// historical day stay together.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockResamplingGenerator {
    settings: PathSettings,
    pools: Vec<ReturnPool>,
    weights: Vec<f64>,
    block_days: usize,
}

impl BlockResamplingGenerator {
    #[must_use]
    pub fn new(
        settings: PathSettings,
        pools: Vec<ReturnPool>,
        weights: &[f64],
        block_days: usize,
    ) -> Self {
        Self {
            settings,
            pools,
            weights: weights.to_vec(),
            block_days: block_days.max(1),
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulatedPath {
        let settings = &self.settings;
        let mut values = settings.new_values();
        let mut value = settings.start_value;

        let longest = self.pools.iter().map(ReturnPool::len).max().unwrap_or(0);
        let mut cursor = 0;
        let mut left_in_block = 0;

        for day in 1..=settings.horizon_days {
            if longest > 0 && left_in_block == 0 {
                cursor = rng.random_range(0..longest);
                left_in_block = self.block_days;
            }

            let mut log_return = 0.0;
            for (pool, w) in self.pools.iter().zip(&self.weights) {
                if !pool.is_empty() {
                    log_return += w * pool.returns[cursor % pool.len()];
                }
            }
            cursor += 1;
            left_in_block = left_in_block.saturating_sub(1);

            value *= log_return.exp();
            if settings.cash_flows.is_flow_day(day) {
                value = settings.cash_flows.apply(value);
            }
            values.push(value);
        }

        SimulatedPath::new(values)
    }
}

/// Path generator for each simulation model
#[derive(Debug, Clone, PartialEq)]
pub enum PathGenerator {
    DriftDiffusion(DiffusionGenerator),
    Resampling(ResamplingGenerator),
    BlockResampling(BlockResamplingGenerator),
}

impl PathGenerator {
    /// Build the generator for `config.model` from parameters estimated for
    /// the same model, one weight per asset.
    pub fn new(
        config: &SimulationConfig,
        weights: &[f64],
        params: ModelParameters,
    ) -> Result<Self, EngineError> {
        if weights.len() != params.num_assets() {
            return Err(EngineError::Validation(format!(
                "portfolio has {} weights but parameters for {} assets",
                weights.len(),
                params.num_assets()
            )));
        }

        let settings = PathSettings::from(config);
        match (config.model, params) {
            (SimulationModel::DriftDiffusion, ModelParameters::Diffusion(p)) => Ok(
                PathGenerator::DriftDiffusion(DiffusionGenerator::new(settings, &p, weights)),
            ),
            (SimulationModel::Resampling, ModelParameters::Resampling(pools)) => Ok(
                PathGenerator::Resampling(ResamplingGenerator::new(settings, pools, weights)),
            ),
            (SimulationModel::BlockResampling, ModelParameters::Resampling(pools)) => {
                Ok(PathGenerator::BlockResampling(BlockResamplingGenerator::new(
                    settings,
                    pools,
                    weights,
                    config.effective_block_days(),
                )))
            }
            (model, _) => Err(EngineError::Validation(format!(
                "parameters do not match model {model}"
            ))),
        }
    }

    /// Generate one path. Deterministic for a given generator state.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulatedPath {
        match self {
            PathGenerator::DriftDiffusion(g) => g.generate(rng),
            PathGenerator::Resampling(g) => g.generate(rng),
            PathGenerator::BlockResampling(g) => g.generate(rng),
        }
    }
}
