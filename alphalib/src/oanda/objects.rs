use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::oanda::helpers::{deserialize_datetime_from_string, deserialize_f64_from_string};

pub const API_URL: &str = "https://api-fxpractice.oanda.com";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub oanda: OandaSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OandaSettings {
    pub account_id: String,
    pub authorization: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    API_URL.to_string()
}

#[derive(Debug, Deserialize)]
pub struct CandlesResponse {
    pub instrument: String,
    pub granularity: String,
    pub candles: Vec<Candle>,
}

#[derive(Debug, Deserialize)]
pub struct Candle {
    pub complete: bool,
    pub volume: f64,
    #[serde(deserialize_with = "deserialize_datetime_from_string")]
    pub time: DateTime<Utc>,
    pub mid: Option<CandleData>,
}

#[derive(Debug, Deserialize)]
pub struct CandleData {
    #[serde(rename = "o", deserialize_with = "deserialize_f64_from_string")]
    pub open: f64,
    #[serde(rename = "h", deserialize_with = "deserialize_f64_from_string")]
    pub high: f64,
    #[serde(rename = "l", deserialize_with = "deserialize_f64_from_string")]
    pub low: f64,
    #[serde(rename = "c", deserialize_with = "deserialize_f64_from_string")]
    pub close: f64,
}
