//! Monte Carlo portfolio simulation engine
//!
//! This crate estimates return parameters from historical prices and
//! simulates portfolio-value paths to produce percentile-based risk and
//! return statistics. It supports:
//! - Drift-diffusion (geometric Brownian motion) paths per asset
//! - i.i.d. and circular block resampling of historical log-returns
//! - Annual contributions on year boundaries
//! - Deterministic, seeded parallel generation across a fixed worker count
//! - Cooperative cancellation and progress reporting
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use drift_core::{MemoryStore, ResultsService, SimulationService};
//!
//! let store = Arc::new(MemoryStore::new());
//! let results = ResultsService::new(store.clone(), store.clone());
//! let engine = SimulationService::new(store.clone(), store.clone(), store);
//!
//! let experiment = results.create_experiment(draft)?;
//! let run = engine.run_experiment(&experiment.id)?;
//! println!("median terminal value: {:.2}", run.stats.p50);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod estimate;
pub mod ingest;
pub mod paths;
pub mod pool;
pub mod ports;
pub mod progress;
pub mod service;
pub mod stats;
pub mod storage;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{SimulationConfig, SimulationModel};
pub use error::{EngineError, IngestError, StoreError};
pub use pool::WorkerPool;
pub use progress::SimulationProgress;
pub use service::{IngestionService, ResultsService, SimulationService};
pub use stats::compute_stats;
pub use storage::MemoryStore;
