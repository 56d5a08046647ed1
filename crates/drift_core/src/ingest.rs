//! CSV price-file parsing
//!
//! Accepts single-symbol files (symbol taken from the file name, e.g.
//! `aapl.csv` becomes `AAPL`) and multi-symbol files with a `symbol` column.
//! Column names are matched case-insensitively; `date` (`YYYY-MM-DD`) and
//! `adjusted_close` are required per row, rows failing either are skipped.
//! `open`, `high`, `low`, `close` and `volume` are optional and default to 0.

use std::io::BufRead;
use std::path::Path;

use jiff::civil::Date;
use rustc_hash::FxHashMap;

use crate::error::IngestError;
use crate::model::PriceRecord;

/// Column positions keyed by lower-cased header name
struct Columns(FxHashMap<String, usize>);

impl Columns {
    fn from_header(line: &str) -> Self {
        Self(
            split_row(line)
                .enumerate()
                .map(|(i, name)| (name.to_ascii_lowercase(), i))
                .collect(),
        )
    }

    fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn field<'a>(&self, row: &[&'a str], name: &str) -> Option<&'a str> {
        let value = *row.get(*self.0.get(name)?)?;
        (!value.is_empty()).then_some(value)
    }

    fn float(&self, row: &[&str], name: &str) -> Option<f64> {
        self.field(row, name)?.parse().ok()
    }
}

fn split_row(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(|f| f.trim().trim_matches('"'))
}

/// Upper-cased file stem: `data/vti.csv` becomes `VTI`
#[must_use]
pub fn symbol_from_filename(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

/// Parse a CSV price file. `filename` supplies the symbol when the file has
/// no `symbol` column.
pub fn parse_price_csv<R: BufRead>(reader: R, filename: &str) -> Result<Vec<PriceRecord>, IngestError> {
    let mut lines = reader.lines();
    let header = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(IngestError::MissingHeader),
        }
    };

    let columns = Columns::from_header(&header);
    let default_symbol = (!columns.has("symbol")).then(|| symbol_from_filename(filename));

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: Vec<&str> = split_row(&line).collect();

        let Some(adjusted_close) = columns
            .float(&row, "adjusted_close")
            .filter(|&v| v > 0.0)
        else {
            skipped += 1;
            continue;
        };
        let Some(date) = columns
            .field(&row, "date")
            .and_then(|d| d.parse::<Date>().ok())
        else {
            skipped += 1;
            continue;
        };

        let symbol = match &default_symbol {
            Some(s) => s.clone(),
            None => columns
                .field(&row, "symbol")
                .unwrap_or_default()
                .to_uppercase(),
        };

        records.push(PriceRecord {
            symbol,
            date,
            open: columns.float(&row, "open").unwrap_or(0.0),
            high: columns.float(&row, "high").unwrap_or(0.0),
            low: columns.float(&row, "low").unwrap_or(0.0),
            close: columns.float(&row, "close").unwrap_or(0.0),
            volume: columns
                .field(&row, "volume")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            adjusted_close,
        });
    }

    if skipped > 0 {
        tracing::debug!(filename, skipped, "skipped rows without a usable date or adjusted close");
    }
    Ok(records)
}
