use thiserror::Error;

/// Errors raised by repository ports.
///
/// Backends convert their native errors into this type so the engine can
/// propagate them unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Errors produced by the simulation engine and its services.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A configuration field violated its constraint
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// Fewer than two usable (positive adjusted-close) records for an asset
    #[error("insufficient price history for {symbol}: need at least 2 usable records, got {usable}")]
    InsufficientHistory { symbol: String, usable: usize },

    #[error("unknown simulation model: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    Persistence(#[from] StoreError),

    /// Simulation was cancelled through its progress handle
    #[error("simulation cancelled")]
    Cancelled,

    /// The OS randomness source could not produce an identity
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("worker pool unavailable: {0}")]
    WorkerPool(String),
}

/// Errors raised while parsing external input files.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing header row")]
    MissingHeader,

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode experiment JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
