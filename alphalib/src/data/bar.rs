use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::data::Symbol;
use crate::errors::AlphaError;

/// An OHLCV bar. `time` is the open time of the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeBar {
    pub symbol: Symbol,
    pub time: DateTime<Utc>,
    pub period: Duration,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl TradeBar {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.time + self.period
    }

    /// Starts a new `period` bar aligned on the window containing `bar`.
    pub fn open_window(bar: &TradeBar, period: Duration) -> Result<TradeBar, AlphaError> {
        Ok(TradeBar {
            symbol: bar.symbol.clone(),
            time: bar.time.duration_trunc(period)?,
            period,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
    }

    /// Folds a later, finer bar into this one.
    pub fn merge(&mut self, bar: &TradeBar) {
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.volume += bar.volume;
    }
}

/// Aggregates time-ordered bars into bars of `period`.
///
/// Bars already at least `period` long are passed through untouched. A trailing
/// window that has not reached its end is dropped, since it is not a complete bar.
pub fn consolidate_bars(bars: &[TradeBar], period: Duration) -> Result<Vec<TradeBar>, AlphaError> {
    let mut consolidated = Vec::new();
    let mut working: Option<TradeBar> = None;

    for bar in bars {
        if bar.period >= period {
            if let Some(partial) = working.take() {
                log::debug!("Dropping partial {} bar at {}", partial.symbol, partial.time);
            }
            consolidated.push(bar.clone());
            continue;
        }

        let window_start = bar.time.duration_trunc(period)?;
        match working.as_mut() {
            Some(current) if current.time == window_start => current.merge(bar),
            _ => working = Some(TradeBar::open_window(bar, period)?),
        }

        if bar.end_time() >= window_start + period {
            if let Some(complete) = working.take() {
                consolidated.push(complete);
            }
        }
    }

    Ok(consolidated)
}
