//! Run orchestration
//!
//! A run moves from `running` to exactly one terminal state:
//!
//! ```text
//! running ──► complete
//!         ├─► failed     (validation, estimation or persistence of inputs)
//!         └─► cancelled  (progress handle cancelled mid-run)
//! ```
//!
//! The running record is written before any work starts and the terminal
//! record once the outcome is known, so every run is persisted exactly twice.

use std::sync::Arc;

use jiff::Timestamp;

use crate::config::SimulationConfig;
use crate::error::{EngineError, Result, StoreError};
use crate::estimate::{AssetHistory, estimate_parameters};
use crate::model::{ExperimentId, Portfolio, Run, RunId, SimulatedPath};
use crate::paths::PathGenerator;
use crate::pool::{WorkerPool, base_seed};
use crate::ports::{ExperimentRepository, PriceHistory, RunRepository};
use crate::progress::SimulationProgress;
use crate::stats::compute_stats;

/// Executes experiments and records their runs
pub struct SimulationService {
    prices: Arc<dyn PriceHistory>,
    experiments: Arc<dyn ExperimentRepository>,
    runs: Arc<dyn RunRepository>,
    pool: WorkerPool,
}

impl SimulationService {
    /// Service using a worker pool sized to the host
    pub fn new(
        prices: Arc<dyn PriceHistory>,
        experiments: Arc<dyn ExperimentRepository>,
        runs: Arc<dyn RunRepository>,
    ) -> Self {
        Self {
            prices,
            experiments,
            runs,
            pool: WorkerPool::available(),
        }
    }

    #[must_use]
    pub fn with_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn pool(&self) -> WorkerPool {
        self.pool
    }

    /// Run an experiment to completion and return the finished run.
    ///
    /// If the run fails or is cancelled and recording that outcome also
    /// fails, the write error is only logged; the simulation error is what
    /// gets returned.
    pub fn run_experiment(&self, experiment_id: &ExperimentId) -> Result<Run> {
        self.execute(experiment_id, None)
    }

    /// Like [`run_experiment`](Self::run_experiment), reporting progress to
    /// and honouring cancellation from `progress`.
    pub fn run_experiment_with_progress(
        &self,
        experiment_id: &ExperimentId,
        progress: &SimulationProgress,
    ) -> Result<Run> {
        self.execute(experiment_id, Some(progress))
    }

    pub fn get_run(&self, run_id: &RunId) -> Result<Run> {
        self.runs
            .get_run(run_id)?
            .ok_or_else(|| StoreError::not_found("run", run_id.as_str()).into())
    }

    /// Validate `config`, estimate parameters from price history and
    /// generate `config.num_paths` paths without recording a run.
    pub fn simulate(
        &self,
        portfolio: &Portfolio,
        config: &SimulationConfig,
        progress: Option<&SimulationProgress>,
    ) -> Result<Vec<SimulatedPath>> {
        config.validate()?;

        let histories = portfolio
            .assets
            .iter()
            .map(|asset| -> Result<AssetHistory> {
                let records = self
                    .prices
                    .price_records(&asset.symbol, config.price_limit())?;
                Ok(AssetHistory::new(asset.symbol.clone(), records))
            })
            .collect::<Result<Vec<_>>>()?;

        let params = estimate_parameters(config.model, &histories)?;
        let generator = PathGenerator::new(config, &portfolio.weights(), params)?;

        self.pool.run(
            config.num_paths,
            base_seed(config.seed),
            progress,
            |rng| generator.generate(rng),
        )
    }

    fn execute(
        &self,
        experiment_id: &ExperimentId,
        progress: Option<&SimulationProgress>,
    ) -> Result<Run> {
        let experiment = self
            .experiments
            .get_experiment(experiment_id)?
            .ok_or_else(|| StoreError::not_found("experiment", experiment_id.as_str()))?;

        let mut run = Run::start(RunId::generate()?, experiment.id.clone(), Timestamp::now());
        self.runs.save_run(&run)?;

        let config = &experiment.config;
        tracing::info!(
            run_id = %run.id,
            experiment_id = %experiment.id,
            model = %config.model,
            num_paths = config.num_paths,
            horizon_days = config.horizon_days,
            workers = self.pool.workers(),
            "run started"
        );

        let outcome = self
            .simulate(&experiment.portfolio, config, progress)
            .map(|paths| compute_stats(&paths, config.start_value, config.horizon_years()));

        match outcome {
            Ok(stats) => {
                run.complete(stats, Timestamp::now());
                self.runs.save_run(&run)?;
                tracing::info!(
                    run_id = %run.id,
                    p50 = stats.p50,
                    probability_of_loss = stats.probability_of_loss,
                    "run complete"
                );
                Ok(run)
            }
            Err(EngineError::Cancelled) => {
                run.cancel(Timestamp::now());
                self.record_unsuccessful(&run);
                tracing::info!(run_id = %run.id, "run cancelled");
                Err(EngineError::Cancelled)
            }
            Err(err) => {
                run.fail(err.to_string(), Timestamp::now());
                self.record_unsuccessful(&run);
                tracing::warn!(run_id = %run.id, error = %err, "run failed");
                Err(err)
            }
        }
    }

    /// Persist a failed or cancelled run. A write failure here is logged
    /// and the simulation's own error is what the caller sees.
    fn record_unsuccessful(&self, run: &Run) {
        if let Err(e) = self.runs.save_run(run) {
            tracing::error!(
                run_id = %run.id,
                status = %run.status,
                error = %e,
                "failed to record run outcome"
            );
        }
    }
}
