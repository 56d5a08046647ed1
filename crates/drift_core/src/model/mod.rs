mod ids;
mod path;
mod portfolio;
mod prices;
mod results;
mod run;

pub use ids::{ExperimentId, RunId};
pub use path::SimulatedPath;
pub use portfolio::{Portfolio, PortfolioAsset, RebalanceFrequency};
pub use prices::{Asset, PriceRecord};
pub use results::ResultStats;
pub use run::{Experiment, ExperimentDraft, Run, RunStatus};
