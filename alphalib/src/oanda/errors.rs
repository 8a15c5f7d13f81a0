use thiserror::Error;

use crate::data::Resolution;

#[derive(Error, Debug)]
pub enum OandaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("received non-success status code {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("OANDA has no candles at {0} resolution")]
    UnsupportedGranularity(Resolution),
}
