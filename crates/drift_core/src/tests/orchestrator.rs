//! Tests for the run lifecycle
//!
//! These tests verify that:
//! - A run is written once as `running` and once in its terminal state
//! - Validation and estimation failures are recorded with their error text
//! - Cancellation produces a `cancelled` run and a distinct error
//! - A failed terminal write does not mask the simulation error

use std::sync::Arc;

use super::{RecordingRuns, config, draft, seeded_store};
use crate::config::SimulationModel;
use crate::error::{EngineError, StoreError};
use crate::model::{Experiment, ExperimentId, RunId, RunStatus};
use crate::pool::WorkerPool;
use crate::ports::{ExperimentRepository, RunRepository};
use crate::progress::SimulationProgress;
use crate::service::{ResultsService, SimulationService};
use crate::storage::MemoryStore;

struct Harness {
    store: Arc<MemoryStore>,
    runs: Arc<RecordingRuns>,
    engine: SimulationService,
}

impl Harness {
    fn new(runs: RecordingRuns) -> Self {
        let store = Arc::new(seeded_store(&["VTI", "BND"], 300));
        let runs = Arc::new(runs);
        let engine = SimulationService::new(store.clone(), store.clone(), runs.clone())
            .with_pool(WorkerPool::new(2));
        Self { store, runs, engine }
    }

    fn create(&self, model: SimulationModel, mutate: impl FnOnce(&mut crate::SimulationConfig)) -> Experiment {
        let mut cfg = config(model);
        mutate(&mut cfg);
        ResultsService::new(self.store.clone(), self.runs.clone())
            .create_experiment(draft(cfg))
            .unwrap()
    }
}

#[test]
fn test_successful_run_is_written_twice() {
    let h = Harness::new(RecordingRuns::default());
    let exp = h.create(SimulationModel::DriftDiffusion, |_| {});

    let run = h.engine.run_experiment(&exp.id).unwrap();
    assert_eq!(run.status, RunStatus::Complete);
    assert_eq!(run.experiment_id, exp.id);
    assert!(run.id.as_str().starts_with("run_"));
    assert!(run.finished_at.is_some_and(|f| f >= run.started_at));
    assert!(run.stats.p50 > 0.0);
    assert!(run.stats.p5 <= run.stats.p50 && run.stats.p50 <= run.stats.p95);

    let writes = h.runs.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].status, RunStatus::Running);
    assert_eq!(writes[0].id, run.id);
    assert_eq!(writes[1], run);

    assert_eq!(h.engine.get_run(&run.id).unwrap(), run);
}

#[test]
fn test_missing_experiment_writes_nothing() {
    let h = Harness::new(RecordingRuns::default());
    let err = h
        .engine
        .run_experiment(&ExperimentId::from("exp_missing"))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Persistence(StoreError::NotFound { kind: "experiment", .. })
    ));
    assert!(h.runs.writes().is_empty());
}

#[test]
fn test_invalid_config_records_failed_run() {
    let h = Harness::new(RecordingRuns::default());
    let exp = h.create(SimulationModel::Resampling, |c| c.num_paths = 0);

    let err = h.engine.run_experiment(&exp.id).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let writes = h.runs.writes();
    assert_eq!(writes.len(), 2);
    let failed = &writes[1];
    assert_eq!(failed.status, RunStatus::Failed);
    assert!(failed.error.contains("num_paths"), "error = {}", failed.error);
    assert!(failed.finished_at.is_some());

    let stored = h.runs.list_runs(&exp.id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, RunStatus::Failed);
}

#[test]
fn test_insufficient_history_records_failed_run() {
    let h = Harness::new(RecordingRuns::default());
    let mut exp = h.create(SimulationModel::BlockResampling, |_| {});
    exp.portfolio.assets[1].symbol = "UNKNOWN".to_string();
    h.store.save_experiment(&exp).unwrap();

    let err = h.engine.run_experiment(&exp.id).unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientHistory {
            symbol: "UNKNOWN".to_string(),
            usable: 0
        }
    );
    let writes = h.runs.writes();
    assert_eq!(writes[1].status, RunStatus::Failed);
    assert!(writes[1].error.contains("UNKNOWN"));
}

#[test]
fn test_cancelled_run() {
    let h = Harness::new(RecordingRuns::default());
    let exp = h.create(SimulationModel::DriftDiffusion, |_| {});

    let progress = SimulationProgress::new();
    progress.cancel();
    let err = h
        .engine
        .run_experiment_with_progress(&exp.id, &progress)
        .unwrap_err();
    assert_eq!(err, EngineError::Cancelled);

    let writes = h.runs.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].status, RunStatus::Cancelled);
    assert!(writes[1].finished_at.is_some());
}

#[test]
fn test_progress_reaches_total() {
    let h = Harness::new(RecordingRuns::default());
    let exp = h.create(SimulationModel::Resampling, |c| c.num_paths = 50);

    let progress = SimulationProgress::new();
    h.engine
        .run_experiment_with_progress(&exp.id, &progress)
        .unwrap();
    assert_eq!(progress.completed(), 50);
    assert_eq!(progress.total(), 50);
}

#[test]
fn test_failed_terminal_write_keeps_original_error() {
    let h = Harness::new(RecordingRuns::failing_terminal_writes());
    let exp = h.create(SimulationModel::DriftDiffusion, |c| c.horizon_days = 0);

    let err = h.engine.run_experiment(&exp.id).unwrap_err();
    assert!(matches!(err, EngineError::Validation(ref m) if m.contains("horizon_days")));
    assert_eq!(h.runs.writes().len(), 2);
}

#[test]
fn test_failed_completion_write_is_reported() {
    let h = Harness::new(RecordingRuns::failing_terminal_writes());
    let exp = h.create(SimulationModel::DriftDiffusion, |c| c.num_paths = 10);

    let err = h.engine.run_experiment(&exp.id).unwrap_err();
    assert_eq!(
        err,
        EngineError::Persistence(StoreError::Backend("disk full".to_string()))
    );
}

#[test]
fn test_get_unknown_run() {
    let h = Harness::new(RecordingRuns::default());
    let err = h.engine.get_run(&RunId::from("run_nope")).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Persistence(StoreError::NotFound { kind: "run", .. })
    ));
}
