use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{WrapErr, eyre};
use drift_core::config::parse_experiment_json;
use drift_core::model::{ExperimentId, RunId};
use drift_core::{
    IngestionService, ResultsService, SimulationProgress, SimulationService, WorkerPool,
};
use drift_store::SqliteStore;

use crate::report;
use crate::{Command, ExperimentCommand};

/// Services wired to one database
pub struct Context {
    ingestion: IngestionService,
    results: ResultsService,
    engine: SimulationService,
}

impl Context {
    pub fn open(db: &Path, workers: Option<usize>) -> color_eyre::Result<Self> {
        if let Some(parent) = db.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("creating {}", parent.display()))?;
        }
        let store = Arc::new(
            SqliteStore::open(db).wrap_err_with(|| format!("opening {}", db.display()))?,
        );

        let pool = workers.map_or_else(WorkerPool::available, WorkerPool::new);
        tracing::debug!(db = %db.display(), workers = pool.workers(), "opened database");
        Ok(Self {
            ingestion: IngestionService::new(store.clone()),
            results: ResultsService::new(store.clone(), store.clone()),
            engine: SimulationService::new(store.clone(), store.clone(), store).with_pool(pool),
        })
    }
}

pub fn dispatch(ctx: &Context, command: Command) -> color_eyre::Result<()> {
    let mut out = std::io::stdout().lock();

    match command {
        Command::Ingest { files } => {
            for file in files {
                let n = ctx
                    .ingestion
                    .ingest_csv_file(&file)
                    .wrap_err_with(|| format!("ingesting {}", file.display()))?;
                writeln!(out, "{}: {n} records", file.display())?;
            }
        }
        Command::Assets => {
            let assets = ctx.ingestion.list_assets()?;
            report::write_assets(&mut out, &assets)?;
        }
        Command::Prices { symbol, limit } => {
            let records = ctx.ingestion.asset_prices(&symbol, limit)?;
            if records.is_empty() {
                return Err(eyre!("no prices stored for {symbol}"));
            }
            report::write_prices(&mut out, &records)?;
        }
        Command::DeleteAsset { symbol } => {
            ctx.ingestion.delete_asset(&symbol)?;
            writeln!(out, "deleted {symbol}")?;
        }
        Command::Experiment(cmd) => experiment(ctx, &mut out, cmd)?,
        Command::Run {
            experiment_id,
            json,
        } => {
            let run = run_with_progress(&ctx.engine, &ExperimentId::from(experiment_id))?;
            report::write_run(&mut out, &run, json)?;
        }
        Command::Runs { experiment_id } => {
            let runs = ctx.results.list_runs(&ExperimentId::from(experiment_id))?;
            report::write_runs(&mut out, &runs)?;
        }
        Command::ShowRun { run_id, json } => {
            let run = ctx.engine.get_run(&RunId::from(run_id))?;
            report::write_run(&mut out, &run, json)?;
        }
    }
    Ok(())
}

fn experiment(ctx: &Context, out: &mut impl Write, cmd: ExperimentCommand) -> color_eyre::Result<()> {
    match cmd {
        ExperimentCommand::Create { file } => {
            let reader = BufReader::new(
                File::open(&file).wrap_err_with(|| format!("opening {}", file.display()))?,
            );
            let draft = parse_experiment_json(reader)
                .wrap_err_with(|| format!("parsing {}", file.display()))?;
            let experiment = ctx.results.create_experiment(draft)?;
            writeln!(out, "{}", experiment.id)?;
        }
        ExperimentCommand::List => {
            let experiments = ctx.results.list_experiments()?;
            report::write_experiments(out, &experiments)?;
        }
        ExperimentCommand::Show { id } => {
            let experiment = ctx.results.get_experiment(&ExperimentId::from(id))?;
            report::write_experiment(out, &experiment)?;
        }
        ExperimentCommand::Delete { id } => {
            ctx.results.delete_experiment(&ExperimentId::from(id.as_str()))?;
            writeln!(out, "deleted {id}")?;
        }
    }
    Ok(())
}

/// Run an experiment on a scoped thread while reporting progress on stderr.
fn run_with_progress(
    engine: &SimulationService,
    experiment_id: &ExperimentId,
) -> color_eyre::Result<drift_core::model::Run> {
    let progress = SimulationProgress::new();

    let result = std::thread::scope(|s| {
        let handle = s.spawn(|| engine.run_experiment_with_progress(experiment_id, &progress));

        let mut err = std::io::stderr();
        while !handle.is_finished() {
            if progress.total() > 0 {
                let _ = write!(
                    err,
                    "\rsimulating {}/{} paths",
                    progress.completed(),
                    progress.total()
                );
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        let _ = writeln!(err);

        handle
            .join()
            .map_err(|_| eyre!("simulation thread panicked"))
    })?;

    Ok(result?)
}
