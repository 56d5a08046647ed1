use rusqlite::Connection;

pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS assets (
    id      TEXT PRIMARY KEY,
    symbol  TEXT NOT NULL UNIQUE,
    name    TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS price_records (
    symbol         TEXT NOT NULL,
    date           TEXT NOT NULL,
    open           REAL NOT NULL DEFAULT 0,
    high           REAL NOT NULL DEFAULT 0,
    low            REAL NOT NULL DEFAULT 0,
    close          REAL NOT NULL DEFAULT 0,
    volume         INTEGER NOT NULL DEFAULT 0,
    adjusted_close REAL NOT NULL,
    PRIMARY KEY (symbol, date)
);

CREATE TABLE IF NOT EXISTS experiments (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    portfolio   TEXT NOT NULL,
    config      TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS runs (
    id            TEXT PRIMARY KEY,
    experiment_id TEXT NOT NULL,
    started_at    TEXT NOT NULL,
    finished_at   TEXT,
    status        TEXT NOT NULL,
    error         TEXT NOT NULL DEFAULT '',
    stats         TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS runs_by_experiment ON runs (experiment_id, started_at);
";

pub(crate) fn init_db(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
