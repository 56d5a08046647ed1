//! In-memory repositories
//!
//! Thread-safe implementations of every port, used by tests and by callers
//! that do not need persistence.

use std::collections::BTreeMap;
use std::sync::RwLock;

use jiff::civil::Date;
use rustc_hash::FxHashMap;

use crate::error::StoreError;
use crate::model::{Asset, Experiment, ExperimentId, PriceRecord, Run, RunId};
use crate::ports::{AssetRepository, ExperimentRepository, PriceHistory, RunRepository};

fn lock_err(context: &'static str) -> StoreError {
    StoreError::Backend(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct MarketState {
    assets: FxHashMap<String, Asset>,
    /// Price history per symbol keyed by date
    prices: FxHashMap<String, BTreeMap<Date, PriceRecord>>,
}

#[derive(Debug, Default)]
struct ExperimentState {
    experiments: FxHashMap<ExperimentId, Experiment>,
    runs: FxHashMap<RunId, Run>,
}

/// Every repository port backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    market: RwLock<MarketState>,
    experiments: RwLock<ExperimentState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriceHistory for MemoryStore {
    fn price_records(&self, symbol: &str, limit: usize) -> Result<Vec<PriceRecord>, StoreError> {
        let state = self.market.read().map_err(|_| lock_err("market"))?;
        let Some(history) = state.prices.get(symbol) else {
            return Ok(Vec::new());
        };

        let skip = match limit {
            0 => 0,
            n => history.len().saturating_sub(n),
        };
        Ok(history.values().skip(skip).cloned().collect())
    }
}

impl AssetRepository for MemoryStore {
    fn upsert_asset(&self, asset: Asset) -> Result<(), StoreError> {
        let mut state = self.market.write().map_err(|_| lock_err("market"))?;
        state.assets.insert(asset.symbol.clone(), asset);
        Ok(())
    }

    fn get_asset(&self, symbol: &str) -> Result<Option<Asset>, StoreError> {
        let state = self.market.read().map_err(|_| lock_err("market"))?;
        Ok(state.assets.get(symbol).cloned())
    }

    fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
        let state = self.market.read().map_err(|_| lock_err("market"))?;
        let mut assets: Vec<Asset> = state.assets.values().cloned().collect();
        assets.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(assets)
    }

    fn delete_asset(&self, symbol: &str) -> Result<(), StoreError> {
        let mut state = self.market.write().map_err(|_| lock_err("market"))?;
        if state.assets.remove(symbol).is_none() {
            return Err(StoreError::not_found("asset", symbol));
        }
        state.prices.remove(symbol);
        Ok(())
    }

    fn upsert_price_records(&self, records: &[PriceRecord]) -> Result<usize, StoreError> {
        let mut state = self.market.write().map_err(|_| lock_err("market"))?;
        for record in records {
            state
                .prices
                .entry(record.symbol.clone())
                .or_default()
                .insert(record.date, record.clone());
        }
        Ok(records.len())
    }
}

impl ExperimentRepository for MemoryStore {
    fn save_experiment(&self, experiment: &Experiment) -> Result<(), StoreError> {
        let mut state = self.experiments.write().map_err(|_| lock_err("experiments"))?;
        state
            .experiments
            .insert(experiment.id.clone(), experiment.clone());
        Ok(())
    }

    fn get_experiment(&self, id: &ExperimentId) -> Result<Option<Experiment>, StoreError> {
        let state = self.experiments.read().map_err(|_| lock_err("experiments"))?;
        Ok(state.experiments.get(id).cloned())
    }

    fn list_experiments(&self) -> Result<Vec<Experiment>, StoreError> {
        let state = self.experiments.read().map_err(|_| lock_err("experiments"))?;
        let mut out: Vec<Experiment> = state.experiments.values().cloned().collect();
        out.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(out)
    }

    fn delete_experiment(&self, id: &ExperimentId) -> Result<(), StoreError> {
        let mut state = self.experiments.write().map_err(|_| lock_err("experiments"))?;
        if state.experiments.remove(id).is_none() {
            return Err(StoreError::not_found("experiment", id.as_str()));
        }
        state.runs.retain(|_, run| run.experiment_id != *id);
        Ok(())
    }
}

impl RunRepository for MemoryStore {
    fn save_run(&self, run: &Run) -> Result<(), StoreError> {
        let mut state = self.experiments.write().map_err(|_| lock_err("runs"))?;
        state.runs.insert(run.id.clone(), run.clone());
        Ok(())
    }

    fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError> {
        let state = self.experiments.read().map_err(|_| lock_err("runs"))?;
        Ok(state.runs.get(id).cloned())
    }

    fn list_runs(&self, experiment_id: &ExperimentId) -> Result<Vec<Run>, StoreError> {
        let state = self.experiments.read().map_err(|_| lock_err("runs"))?;
        let mut out: Vec<Run> = state
            .runs
            .values()
            .filter(|r| r.experiment_id == *experiment_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(out)
    }
}
