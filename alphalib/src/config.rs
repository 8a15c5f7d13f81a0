use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::{Resolution, Symbol};
use crate::errors::AlphaError;
use crate::indicators::IndicatorPref;
use crate::oanda::objects::Settings;

const DEFAULT_POLL_SECONDS: u64 = 60;

/// Top-level run configuration, loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingConfig {
    pub instruments: Vec<String>,
    pub model: String,
    #[serde(default)]
    pub model_config: serde_json::Value,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
}

fn default_poll_seconds() -> u64 {
    DEFAULT_POLL_SECONDS
}

impl TradingConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AlphaError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AlphaError::Config(format!("reading {}: {}", path.display(), e)))?;
        TradingConfig::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, AlphaError> {
        let config: TradingConfig = serde_json::from_str(contents)?;
        if config.instruments.is_empty() {
            return Err(AlphaError::Config("no instruments configured".to_string()));
        }
        if config.poll_seconds == 0 {
            return Err(AlphaError::Config("pollSeconds must be positive".to_string()));
        }
        Ok(config)
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.instruments.iter().map(|ticker| Symbol::new(ticker.as_str())).collect()
    }

    /// The `modelConfig` object read as historical alpha parameters.
    pub fn historical_alpha(&self) -> Result<HistoricalAlphaConfig, AlphaError> {
        let config = if self.model_config.is_null() {
            HistoricalAlphaConfig::default()
        } else {
            serde_json::from_value(self.model_config.clone())?
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalAlphaConfig {
    pub lookback: usize,
    pub resolution: Resolution,
    pub indicator: IndicatorPref,
}

impl Default for HistoricalAlphaConfig {
    fn default() -> Self {
        HistoricalAlphaConfig {
            lookback: 1,
            resolution: Resolution::Daily,
            indicator: IndicatorPref::CvClipping,
        }
    }
}

impl HistoricalAlphaConfig {
    pub fn validate(&self) -> Result<(), AlphaError> {
        if self.lookback == 0 {
            return Err(AlphaError::InvalidLookback(self.lookback));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

pub fn read_settings(path: impl AsRef<Path>) -> Result<Settings, AlphaError> {
    let settings = std::fs::read_to_string(path)?;
    serde_json::from_str(&settings).map_err(|e| e.into())
}
