//! SQLite persistence for drift
//!
//! [`SqliteStore`] implements every repository port from `drift_core` on a
//! single SQLite connection. Portfolios, configs and run statistics are kept
//! as JSON columns; timestamps as RFC 3339 text with fixed nanosecond
//! precision so they sort lexically.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use drift_core::StoreError;
use drift_core::model::{
    Asset, Experiment, ExperimentId, PriceRecord, Run, RunId, RunStatus,
};
use drift_core::ports::{AssetRepository, ExperimentRepository, PriceHistory, RunRepository};
use jiff::Timestamp;
use jiff::civil::Date;
use jiff::fmt::temporal::DateTimePrinter;
use rusqlite::{Connection, OptionalExtension, Row, params};

mod schema;

fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn format_ts(ts: &Timestamp) -> String {
    DateTimePrinter::new().precision(Some(9)).timestamp_to_string(ts)
}

fn parse_ts(s: &str) -> Result<Timestamp, StoreError> {
    s.parse()
        .map_err(|e| StoreError::Serialization(format!("bad timestamp {s:?}: {e}")))
}

fn parse_date(s: &str) -> Result<Date, StoreError> {
    s.parse()
        .map_err(|e| StoreError::Serialization(format!("bad date {s:?}: {e}")))
}

/// Every repository port backed by one SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(db_err)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    /// Private in-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory().map_err(db_err)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        schema::init_db(&conn).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("poisoned lock: connection".to_string()))
    }
}

// ──────────────────── Row mapping ────────────────────────────────────────────

struct PriceRow {
    symbol: String,
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    adjusted_close: f64,
}

impl PriceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            symbol: row.get(0)?,
            date: row.get(1)?,
            open: row.get(2)?,
            high: row.get(3)?,
            low: row.get(4)?,
            close: row.get(5)?,
            volume: row.get(6)?,
            adjusted_close: row.get(7)?,
        })
    }

    fn decode(self) -> Result<PriceRecord, StoreError> {
        Ok(PriceRecord {
            date: parse_date(&self.date)?,
            symbol: self.symbol,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            adjusted_close: self.adjusted_close,
        })
    }
}

/// Experiment columns as stored, before JSON and timestamp decoding
struct ExperimentRow {
    id: String,
    name: String,
    description: String,
    portfolio: String,
    config: String,
    created_at: String,
    updated_at: String,
}

impl ExperimentRow {
    const COLUMNS: &'static str = "id, name, description, portfolio, config, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            portfolio: row.get(3)?,
            config: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn decode(self) -> Result<Experiment, StoreError> {
        Ok(Experiment {
            id: ExperimentId(self.id),
            name: self.name,
            description: self.description,
            portfolio: serde_json::from_str(&self.portfolio)?,
            config: serde_json::from_str(&self.config)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

struct RunRow {
    id: String,
    experiment_id: String,
    started_at: String,
    finished_at: Option<String>,
    status: String,
    error: String,
    stats: String,
}

impl RunRow {
    const COLUMNS: &'static str = "id, experiment_id, started_at, finished_at, status, error, stats";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            experiment_id: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            status: row.get(4)?,
            error: row.get(5)?,
            stats: row.get(6)?,
        })
    }

    fn decode(self) -> Result<Run, StoreError> {
        Ok(Run {
            id: RunId(self.id),
            experiment_id: ExperimentId(self.experiment_id),
            started_at: parse_ts(&self.started_at)?,
            finished_at: self.finished_at.as_deref().map(parse_ts).transpose()?,
            status: self.status.parse::<RunStatus>()?,
            error: self.error,
            stats: serde_json::from_str(&self.stats)?,
        })
    }
}

// ──────────────────── PriceHistory / AssetRepository ─────────────────────────

impl PriceHistory for SqliteStore {
    fn price_records(&self, symbol: &str, limit: usize) -> Result<Vec<PriceRecord>, StoreError> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = match limit {
            0 => -1,
            n => i64::try_from(n).unwrap_or(i64::MAX),
        };

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, date, open, high, low, close, volume, adjusted_close FROM (
                    SELECT * FROM price_records WHERE symbol = ?1 ORDER BY date DESC LIMIT ?2
                 ) ORDER BY date ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![symbol, limit], PriceRow::from_row)
            .map_err(db_err)?;
        rows.map(|row| row.map_err(db_err).and_then(PriceRow::decode))
            .collect()
    }
}

impl AssetRepository for SqliteStore {
    fn upsert_asset(&self, asset: Asset) -> Result<(), StoreError> {
        let id = if asset.id.is_empty() {
            asset.symbol.clone()
        } else {
            asset.id
        };
        self.conn()?
            .execute(
                "INSERT INTO assets (id, symbol, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(symbol) DO UPDATE SET name = excluded.name",
                params![id, asset.symbol, asset.name],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn get_asset(&self, symbol: &str) -> Result<Option<Asset>, StoreError> {
        self.conn()?
            .query_row(
                "SELECT id, symbol, name FROM assets WHERE symbol = ?1",
                [symbol],
                |row| {
                    Ok(Asset {
                        id: row.get(0)?,
                        symbol: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(db_err)
    }

    fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, symbol, name FROM assets ORDER BY symbol")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Asset {
                    id: row.get(0)?,
                    symbol: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn delete_asset(&self, symbol: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        let deleted = tx
            .execute("DELETE FROM assets WHERE symbol = ?1", [symbol])
            .map_err(db_err)?;
        if deleted == 0 {
            return Err(StoreError::not_found("asset", symbol));
        }
        tx.execute("DELETE FROM price_records WHERE symbol = ?1", [symbol])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)
    }

    fn upsert_price_records(&self, records: &[PriceRecord]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO price_records
                        (symbol, date, open, high, low, close, volume, adjusted_close)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(symbol, date) DO UPDATE SET
                        open = excluded.open, high = excluded.high, low = excluded.low,
                        close = excluded.close, volume = excluded.volume,
                        adjusted_close = excluded.adjusted_close",
                )
                .map_err(db_err)?;
            for r in records {
                stmt.execute(params![
                    r.symbol,
                    r.date.to_string(),
                    r.open,
                    r.high,
                    r.low,
                    r.close,
                    r.volume,
                    r.adjusted_close
                ])
                .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)?;
        tracing::debug!(records = records.len(), "upserted price records");
        Ok(records.len())
    }
}

// ──────────────────── ExperimentRepository ───────────────────────────────────

impl ExperimentRepository for SqliteStore {
    fn save_experiment(&self, experiment: &Experiment) -> Result<(), StoreError> {
        let portfolio = serde_json::to_string(&experiment.portfolio)?;
        let config = serde_json::to_string(&experiment.config)?;
        self.conn()?
            .execute(
                "INSERT INTO experiments
                    (id, name, description, portfolio, config, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name, description = excluded.description,
                    portfolio = excluded.portfolio, config = excluded.config,
                    updated_at = excluded.updated_at",
                params![
                    experiment.id.as_str(),
                    experiment.name,
                    experiment.description,
                    portfolio,
                    config,
                    format_ts(&experiment.created_at),
                    format_ts(&experiment.updated_at),
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn get_experiment(&self, id: &ExperimentId) -> Result<Option<Experiment>, StoreError> {
        let row = self
            .conn()?
            .query_row(
                &format!("SELECT {} FROM experiments WHERE id = ?1", ExperimentRow::COLUMNS),
                [id.as_str()],
                ExperimentRow::from_row,
            )
            .optional()
            .map_err(db_err)?;
        row.map(ExperimentRow::decode).transpose()
    }

    fn list_experiments(&self) -> Result<Vec<Experiment>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM experiments ORDER BY created_at DESC, id ASC",
                ExperimentRow::COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], ExperimentRow::from_row)
            .map_err(db_err)?;
        rows.map(|row| row.map_err(db_err).and_then(ExperimentRow::decode))
            .collect()
    }

    fn delete_experiment(&self, id: &ExperimentId) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        let deleted = tx
            .execute("DELETE FROM experiments WHERE id = ?1", [id.as_str()])
            .map_err(db_err)?;
        if deleted == 0 {
            return Err(StoreError::not_found("experiment", id.as_str()));
        }
        let runs = tx
            .execute("DELETE FROM runs WHERE experiment_id = ?1", [id.as_str()])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        tracing::debug!(experiment_id = %id, runs, "deleted experiment");
        Ok(())
    }
}

// ──────────────────── RunRepository ──────────────────────────────────────────

impl RunRepository for SqliteStore {
    fn save_run(&self, run: &Run) -> Result<(), StoreError> {
        let stats = serde_json::to_string(&run.stats)?;
        self.conn()?
            .execute(
                "INSERT INTO runs
                    (id, experiment_id, started_at, finished_at, status, error, stats)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    finished_at = excluded.finished_at, status = excluded.status,
                    error = excluded.error, stats = excluded.stats",
                params![
                    run.id.as_str(),
                    run.experiment_id.as_str(),
                    format_ts(&run.started_at),
                    run.finished_at.as_ref().map(format_ts),
                    run.status.as_str(),
                    run.error,
                    stats,
                ],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn get_run(&self, id: &RunId) -> Result<Option<Run>, StoreError> {
        let row = self
            .conn()?
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RunRow::COLUMNS),
                [id.as_str()],
                RunRow::from_row,
            )
            .optional()
            .map_err(db_err)?;
        row.map(RunRow::decode).transpose()
    }

    fn list_runs(&self, experiment_id: &ExperimentId) -> Result<Vec<Run>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM runs WHERE experiment_id = ?1
                 ORDER BY started_at DESC, id DESC",
                RunRow::COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map([experiment_id.as_str()], RunRow::from_row)
            .map_err(db_err)?;
        rows.map(|row| row.map_err(db_err).and_then(RunRow::decode))
            .collect()
    }
}
