//! Application services composed over the repository ports

mod ingestion;
mod results;
mod simulation;

pub use ingestion::IngestionService;
pub use results::ResultsService;
pub use simulation::SimulationService;
