use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod report;

use logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "drift")]
#[command(about = "Monte Carlo portfolio simulation from historical prices")]
struct Args {
    /// Path to the SQLite database (default: ~/.drift/drift.db)
    #[arg(long, env = "DRIFT_DB", global = true)]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DRIFT_LOG", default_value = "info", global = true)]
    log_level: String,

    /// Simulation worker count (default: available parallelism)
    #[arg(short, long, env = "DRIFT_WORKERS", global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load CSV price files; the file name is the symbol unless a `symbol` column is present
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List known assets
    Assets,
    /// Show the most recent prices of an asset
    Prices {
        symbol: String,
        /// Number of records, 0 for all
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Delete an asset and its price history
    DeleteAsset { symbol: String },
    /// Manage experiments
    #[command(subcommand)]
    Experiment(ExperimentCommand),
    /// Run an experiment and print its statistics
    Run {
        experiment_id: String,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the runs of an experiment, most recent first
    Runs { experiment_id: String },
    /// Show a recorded run
    ShowRun {
        run_id: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ExperimentCommand {
    /// Create an experiment from a JSON file
    Create { file: PathBuf },
    /// List experiments, newest first
    List,
    /// Show an experiment's portfolio and configuration
    Show { id: String },
    /// Delete an experiment and its runs
    Delete { id: String },
}

fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".drift")
        .join("drift.db")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let db = args.db.clone().unwrap_or_else(default_db_path);
    let ctx = commands::Context::open(&db, args.workers)?;
    commands::dispatch(&ctx, args.command)
}
