//! JSON experiment files
//!
//! Lets an experiment be staged from a file instead of built in code:
//!
//! ```json
//! {
//!   "version": "1",
//!   "experiment": { "name": "60/40", "description": "classic split" },
//!   "portfolio": {
//!     "assets": [{ "symbol": "VTI", "weight": 0.6 }, { "symbol": "BND", "weight": 0.4 }],
//!     "rebalance": "annual"
//!   },
//!   "simulation": {
//!     "model": "bootstrap", "num_paths": 5000, "horizon_days": 2520,
//!     "lookback_days": 1260, "start_value": 100000, "seed": 7
//!   },
//!   "parameters": { "annual_contribution": 6000, "withdrawal_rate": 0.04 }
//! }
//! ```
//!
//! This loader fills defaults (`gbm` model, `none` rebalance, zero cash
//! flows). Missing required numbers are left at zero so that engine
//! validation reports them.

use std::io::Read;

use serde::{Deserialize, Serialize};

use super::{SimulationConfig, SimulationModel};
use crate::error::IngestError;
use crate::model::{ExperimentDraft, Portfolio, PortfolioAsset, RebalanceFrequency};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentFile {
    pub version: String,
    pub experiment: ExperimentMeta,
    pub portfolio: PortfolioSection,
    pub simulation: SimulationSection,
    pub parameters: ParameterSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentMeta {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSection {
    pub assets: Vec<AssetEntry>,
    pub rebalance: Option<RebalanceFrequency>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetEntry {
    pub symbol: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub model: Option<String>,
    pub num_paths: usize,
    pub horizon_days: usize,
    pub lookback_days: usize,
    pub start_value: f64,
    pub seed: Option<i64>,
    pub block_days: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSection {
    pub annual_contribution: f64,
    pub withdrawal_rate: Option<f64>,
}

impl ExperimentFile {
    /// Convert into an experiment draft, resolving the model identifier.
    pub fn into_draft(self) -> Result<ExperimentDraft, IngestError> {
        let model = match self.simulation.model.as_deref() {
            None | Some("") => SimulationModel::default(),
            Some(id) => id.parse()?,
        };

        Ok(ExperimentDraft {
            name: self.experiment.name,
            description: self.experiment.description,
            portfolio: Portfolio {
                assets: self
                    .portfolio
                    .assets
                    .into_iter()
                    .map(|a| PortfolioAsset::new(a.symbol, a.weight))
                    .collect(),
                rebalance: self.portfolio.rebalance.unwrap_or_default(),
            },
            config: SimulationConfig {
                model,
                num_paths: self.simulation.num_paths,
                horizon_days: self.simulation.horizon_days,
                lookback_days: self.simulation.lookback_days,
                start_value: self.simulation.start_value,
                seed: self.simulation.seed,
                annual_contribution: self.parameters.annual_contribution,
                withdrawal_rate: self.parameters.withdrawal_rate.unwrap_or(0.0),
                block_days: self.simulation.block_days,
            },
        })
    }
}

/// Parse an experiment JSON document into a draft.
pub fn parse_experiment_json<R: Read>(reader: R) -> Result<ExperimentDraft, IngestError> {
    let file: ExperimentFile = serde_json::from_reader(reader)?;
    file.into_draft()
}
