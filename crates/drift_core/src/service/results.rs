use std::sync::Arc;

use jiff::Timestamp;

use crate::error::{Result, StoreError};
use crate::model::{Experiment, ExperimentDraft, ExperimentId, ResultStats, Run, RunId};
use crate::ports::{ExperimentRepository, RunRepository};

/// Experiment bookkeeping and access to recorded run results
pub struct ResultsService {
    experiments: Arc<dyn ExperimentRepository>,
    runs: Arc<dyn RunRepository>,
}

impl ResultsService {
    pub fn new(experiments: Arc<dyn ExperimentRepository>, runs: Arc<dyn RunRepository>) -> Self {
        Self { experiments, runs }
    }

    /// Save a draft as a new experiment with a fresh id and timestamps.
    pub fn create_experiment(&self, draft: ExperimentDraft) -> Result<Experiment> {
        let experiment = Experiment::from_draft(ExperimentId::generate()?, draft, Timestamp::now());
        self.experiments.save_experiment(&experiment)?;
        tracing::info!(experiment_id = %experiment.id, name = %experiment.name, "experiment created");
        Ok(experiment)
    }

    pub fn get_experiment(&self, id: &ExperimentId) -> Result<Experiment> {
        self.experiments
            .get_experiment(id)?
            .ok_or_else(|| StoreError::not_found("experiment", id.as_str()).into())
    }

    /// Newest first
    pub fn list_experiments(&self) -> Result<Vec<Experiment>> {
        Ok(self.experiments.list_experiments()?)
    }

    /// Runs of an experiment, most recent first
    pub fn list_runs(&self, experiment_id: &ExperimentId) -> Result<Vec<Run>> {
        Ok(self.runs.list_runs(experiment_id)?)
    }

    pub fn get_run_stats(&self, run_id: &RunId) -> Result<ResultStats> {
        self.runs
            .get_run(run_id)?
            .map(|run| run.stats)
            .ok_or_else(|| StoreError::not_found("run", run_id.as_str()).into())
    }

    pub fn delete_experiment(&self, id: &ExperimentId) -> Result<()> {
        self.experiments.delete_experiment(id)?;
        tracing::info!(experiment_id = %id, "experiment deleted");
        Ok(())
    }
}
