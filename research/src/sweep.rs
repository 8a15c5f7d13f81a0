use alphalib::config::HistoricalAlphaConfig;
use alphalib::data::{Symbol, TradeBar};
use alphalib::indicators::IndicatorRegistry;
use anyhow::Result;
use rayon::prelude::*;

use crate::backtesting::{Backtest, BacktestSummary};

// Runs one independent backtest per lookback in parallel.
// Each worker builds its own engine; only the bars are shared.
pub fn sweep_lookbacks(
    base: HistoricalAlphaConfig,
    lookbacks: &[usize],
    bars: &[TradeBar],
    symbols: &[Symbol],
) -> Vec<(usize, Result<BacktestSummary>)> {
    lookbacks
        .par_iter()
        .map(|&lookback| {
            let config = HistoricalAlphaConfig { lookback, ..base };
            let result = Backtest::new(config, Box::new(IndicatorRegistry::new()), bars, symbols)
                .and_then(|mut backtest| {
                    backtest.run()?;
                    Ok(backtest.summary())
                });
            (lookback, result)
        })
        .collect()
}

pub fn parse_lookbacks(raw: &str) -> Result<Vec<usize>> {
    let mut lookbacks = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let lookback: usize = part.parse()?;
        if lookback == 0 {
            anyhow::bail!("lookback must be at least 1");
        }
        lookbacks.push(lookback);
    }
    if lookbacks.is_empty() {
        anyhow::bail!("no lookbacks given");
    }
    Ok(lookbacks)
}
