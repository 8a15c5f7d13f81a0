use std::time::Duration;

use futures::future::try_join_all;
use reqwest::header::{HeaderMap, HeaderValue};
use tokio::time::timeout;

use crate::data::{Resolution, Symbol, TradeBar};
use crate::oanda::errors::OandaError;
use crate::oanda::objects::{CandlesResponse, OandaSettings};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CANDLE_COUNT: usize = 5000;

pub fn granularity(resolution: Resolution) -> Result<&'static str, OandaError> {
    match resolution {
        Resolution::Minute => Ok("M1"),
        Resolution::Hour => Ok("H1"),
        Resolution::Daily => Ok("D"),
        Resolution::Second => Err(OandaError::UnsupportedGranularity(resolution)),
    }
}

/// Converts a candles payload to bars, keeping only complete mid-price candles.
pub fn parse_candles(body: &str, resolution: Resolution) -> Result<Vec<TradeBar>, OandaError> {
    let response: CandlesResponse = serde_json::from_str(body)?;
    let symbol = Symbol::new(response.instrument.as_str());

    let bars = response
        .candles
        .into_iter()
        .filter(|candle| candle.complete)
        .filter_map(|candle| {
            let mid = candle.mid?;
            Some(TradeBar {
                symbol: symbol.clone(),
                time: candle.time,
                period: resolution.to_duration(),
                open: mid.open,
                high: mid.high,
                low: mid.low,
                close: mid.close,
                volume: candle.volume,
            })
        })
        .collect();
    Ok(bars)
}

/// Fetches the most recent `count` candles for one instrument.
pub async fn get_candles(
    instrument: &str,
    resolution: Resolution,
    count: usize,
    settings: &OandaSettings,
) -> Result<Vec<TradeBar>, OandaError> {
    let authorization = format!("Bearer {}", &settings.authorization);
    let endpoint = format!(
        "/v3/instruments/{}/candles?price=M&granularity={}&count={}",
        instrument,
        granularity(resolution)?,
        count.clamp(1, MAX_CANDLE_COUNT)
    );
    let url = format!("{}{}", settings.api_url, endpoint);

    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(authorization.as_str())?,
    );
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));

    let request = reqwest::Client::new().get(&url).headers(headers).send();
    let response = timeout(REQUEST_TIMEOUT, request).await??;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(OandaError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bars = parse_candles(&body, resolution)?;
    log::debug!("Fetched {} {} candles for {}", bars.len(), resolution, instrument);
    Ok(bars)
}

/// Fetches candles for every instrument concurrently.
pub async fn get_candles_for(
    instruments: &[String],
    resolution: Resolution,
    count: usize,
    settings: &OandaSettings,
) -> Result<Vec<TradeBar>, OandaError> {
    let requests = instruments
        .iter()
        .map(|instrument| get_candles(instrument, resolution, count, settings));
    let per_instrument = try_join_all(requests).await?;
    Ok(per_instrument.into_iter().flatten().collect())
}
