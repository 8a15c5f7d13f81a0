use thiserror::Error;

use crate::data::Symbol;
use crate::host::ConsolidatorId;

#[derive(Error, Debug)]
pub enum AlphaError {
    #[error("config error: {0}")]
    Config(String),

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("lookback must be at least 1, got {0}")]
    InvalidLookback(usize),

    #[error("no consolidator {id} registered for {symbol}")]
    UnknownConsolidator { symbol: Symbol, id: ConsolidatorId },

    #[error("slice at {slice} is older than the algorithm clock at {clock}")]
    OutOfOrderSlice {
        slice: chrono::DateTime<chrono::Utc>,
        clock: chrono::DateTime<chrono::Utc>,
    },

    #[error("logging setup error: {0}")]
    Logging(String),

    #[error("time rounding error: {0}")]
    Rounding(#[from] chrono::RoundingError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
