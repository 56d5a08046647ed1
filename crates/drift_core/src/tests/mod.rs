//! Integration tests for the drift simulation engine
//!
//! Tests are organized by topic:
//! - `determinism` - Seeded reproducibility and path shape for every model
//! - `orchestrator` - Run lifecycle, persistence and failure handling
//! - `scenarios` - End-to-end flows through the services

mod orchestrator;

use std::sync::Mutex;

use jiff::civil::{Date, date};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::config::{SimulationConfig, SimulationModel};
use crate::error::StoreError;
use crate::model::{
    ExperimentDraft, ExperimentId, Portfolio, PortfolioAsset, PriceRecord, Run, RunId,
};
use crate::ports::{AssetRepository, RunRepository};
use crate::storage::MemoryStore;

/// Synthetic daily closes following a seeded lognormal random walk
pub(crate) fn synthetic_prices(symbol: &str, days: usize, seed: u64) -> Vec<PriceRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let shocks = Normal::new(0.0003, 0.01).unwrap();
    let start = date(2015, 1, 1);

    let mut close = 100.0;
    (0..days)
        .map(|i| {
            if i > 0 {
                close *= f64::exp(shocks.sample(&mut rng));
            }
            PriceRecord::adjusted(symbol, day(start, i), close)
        })
        .collect()
}

fn day(start: Date, offset: usize) -> Date {
    start
        .checked_add(jiff::Span::new().days(offset as i64))
        .unwrap()
}

/// Store holding `days` of synthetic history for each symbol
pub(crate) fn seeded_store(symbols: &[&str], days: usize) -> MemoryStore {
    let store = MemoryStore::new();
    for (i, symbol) in symbols.iter().enumerate() {
        store
            .upsert_price_records(&synthetic_prices(symbol, days, i as u64 + 1))
            .unwrap();
    }
    store
}

pub(crate) fn config(model: SimulationModel) -> SimulationConfig {
    SimulationConfig {
        model,
        num_paths: 200,
        horizon_days: 252,
        lookback_days: 252,
        start_value: 100_000.0,
        seed: Some(42),
        ..Default::default()
    }
}

pub(crate) fn sixty_forty() -> Portfolio {
    Portfolio {
        assets: vec![
            PortfolioAsset::new("VTI", 0.6),
            PortfolioAsset::new("BND", 0.4),
        ],
        ..Default::default()
    }
}

pub(crate) fn draft(config: SimulationConfig) -> ExperimentDraft {
    ExperimentDraft {
        name: "60/40".to_string(),
        description: String::new(),
        portfolio: sixty_forty(),
        config,
    }
}

/// Run repository that records every write and can refuse terminal writes
#[derive(Default)]
pub(crate) struct RecordingRuns {
    pub inner: MemoryStore,
    pub writes: Mutex<Vec<Run>>,
    pub fail_terminal_writes: bool,
}

impl RecordingRuns {
    pub fn failing_terminal_writes() -> Self {
        Self {
            fail_terminal_writes: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<Run> {
        self.writes.lock().unwrap().clone()
    }
}

impl RunRepository for RecordingRuns {
    fn save_run(&self, run: &Run) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push(run.clone());
        if self.fail_terminal_writes && run.status.is_terminal() {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.save_run(run)
    }

    fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError> {
        self.inner.get_run(id)
    }

    fn list_runs(&self, experiment_id: &ExperimentId) -> Result<Vec<Run>, StoreError> {
        self.inner.list_runs(experiment_id)
    }
}
