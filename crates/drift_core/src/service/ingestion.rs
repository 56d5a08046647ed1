use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::{EngineError, IngestError, Result};
use crate::ingest::parse_price_csv;
use crate::model::{Asset, PriceRecord};
use crate::ports::AssetRepository;

/// Loads price files into the asset repository
pub struct IngestionService {
    assets: Arc<dyn AssetRepository>,
}

impl IngestionService {
    pub fn new(assets: Arc<dyn AssetRepository>) -> Self {
        Self { assets }
    }

    /// Parse a CSV price file and store its records, registering any symbol
    /// not yet known as an asset. Returns the number of records stored.
    pub fn ingest_csv<R: BufRead>(&self, reader: R, filename: &str) -> std::result::Result<usize, IngestError> {
        let records = parse_price_csv(reader, filename)?;

        let mut seen = FxHashSet::default();
        for record in &records {
            if seen.insert(record.symbol.as_str()) && self.asset(&record.symbol)?.is_none() {
                self.assets
                    .upsert_asset(Asset::from_symbol(record.symbol.clone()))
                    .map_err(EngineError::from)?;
                tracing::debug!(symbol = %record.symbol, "registered asset");
            }
        }

        let written = self
            .assets
            .upsert_price_records(&records)
            .map_err(EngineError::from)?;
        tracing::info!(filename, records = written, symbols = seen.len(), "ingested price file");
        Ok(written)
    }

    pub fn ingest_csv_file(&self, path: impl AsRef<Path>) -> std::result::Result<usize, IngestError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.ingest_csv(BufReader::new(file), &path.to_string_lossy())
    }

    pub fn list_assets(&self) -> Result<Vec<Asset>> {
        Ok(self.assets.list_assets()?)
    }

    /// The `limit` most recent records, ascending; 0 for all
    pub fn asset_prices(&self, symbol: &str, limit: usize) -> Result<Vec<PriceRecord>> {
        Ok(self.assets.price_records(symbol, limit)?)
    }

    /// Remove an asset and its price history
    pub fn delete_asset(&self, symbol: &str) -> Result<()> {
        self.assets.delete_asset(symbol)?;
        tracing::info!(symbol, "asset deleted");
        Ok(())
    }

    fn asset(&self, symbol: &str) -> Result<Option<Asset>> {
        Ok(self.assets.get_asset(symbol)?)
    }
}
