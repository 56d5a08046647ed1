//! Repository ports
//!
//! The engine and its services only talk to storage through these traits.
//! [`crate::storage::MemoryStore`] implements all of them in memory; the
//! `drift_store` crate provides a SQLite backend.
//!
//! Implementations must be safe to share across threads. Lookups return
//! `Ok(None)` for a missing item; deletes of a missing item fail with
//! [`StoreError::NotFound`].

use crate::error::StoreError;
use crate::model::{Asset, Experiment, ExperimentId, PriceRecord, Run, RunId};

/// Read access to daily price history
pub trait PriceHistory: Send + Sync {
    /// The `limit` most recent records for `symbol` in ascending date order.
    /// A `limit` of 0 returns the full history. Unknown symbols yield an
    /// empty list.
    fn price_records(&self, symbol: &str, limit: usize) -> Result<Vec<PriceRecord>, StoreError>;
}

/// Asset registry and price history writes
pub trait AssetRepository: PriceHistory {
    /// Insert or replace the asset with the same symbol
    fn upsert_asset(&self, asset: Asset) -> Result<(), StoreError>;

    fn get_asset(&self, symbol: &str) -> Result<Option<Asset>, StoreError>;

    /// All assets ordered by symbol
    fn list_assets(&self) -> Result<Vec<Asset>, StoreError>;

    /// Delete an asset together with its price history
    fn delete_asset(&self, symbol: &str) -> Result<(), StoreError>;

    /// Insert records, replacing any with the same symbol and date.
    /// Returns the number of records written.
    fn upsert_price_records(&self, records: &[PriceRecord]) -> Result<usize, StoreError>;
}

pub trait ExperimentRepository: Send + Sync {
    /// Insert or replace by id
    fn save_experiment(&self, experiment: &Experiment) -> Result<(), StoreError>;

    fn get_experiment(&self, id: &ExperimentId) -> Result<Option<Experiment>, StoreError>;

    /// All experiments, most recently created first
    fn list_experiments(&self) -> Result<Vec<Experiment>, StoreError>;

    /// Delete an experiment and every run recorded for it
    fn delete_experiment(&self, id: &ExperimentId) -> Result<(), StoreError>;
}

pub trait RunRepository: Send + Sync {
    /// Insert or replace by id
    fn save_run(&self, run: &Run) -> Result<(), StoreError>;

    fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError>;

    /// Runs of one experiment, most recently started first
    fn list_runs(&self, experiment_id: &ExperimentId) -> Result<Vec<Run>, StoreError>;
}
