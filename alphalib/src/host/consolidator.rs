use chrono::{Duration, DurationRound};

use crate::data::{Symbol, TradeBar};
use crate::errors::AlphaError;
use crate::host::ConsolidatorId;
use crate::indicators::SharedIndicator;

/// Aggregates one symbol's bars into bars of `period` and feeds the result to
/// its registered indicators.
pub struct TradeBarConsolidator {
    id: ConsolidatorId,
    symbol: Symbol,
    period: Duration,
    working: Option<TradeBar>,
    indicators: Vec<SharedIndicator>,
}

impl TradeBarConsolidator {
    pub fn new(id: ConsolidatorId, symbol: Symbol, period: Duration) -> Self {
        TradeBarConsolidator {
            id,
            symbol,
            period,
            working: None,
            indicators: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn register(&mut self, indicator: SharedIndicator) {
        self.indicators.push(indicator);
    }

    /// Pushes one input bar, returning every consolidated bar it completed.
    pub fn update(&mut self, bar: &TradeBar) -> Result<Vec<TradeBar>, AlphaError> {
        let mut emitted = Vec::new();

        if bar.period >= self.period {
            if let Some(partial) = self.working.take() {
                emitted.push(partial);
            }
            emitted.push(bar.clone());
        } else {
            let window_start = bar.time.duration_trunc(self.period)?;
            let stale = matches!(&self.working, Some(current) if current.time != window_start);
            if stale {
                if let Some(previous) = self.working.take() {
                    emitted.push(previous);
                }
            }

            match self.working.as_mut() {
                Some(current) => current.merge(bar),
                None => self.working = Some(TradeBar::open_window(bar, self.period)?),
            }

            if bar.end_time() >= window_start + self.period {
                if let Some(complete) = self.working.take() {
                    emitted.push(complete);
                }
            }
        }

        for consolidated in &emitted {
            self.publish(consolidated);
        }
        Ok(emitted)
    }

    fn publish(&self, bar: &TradeBar) {
        log::debug!("Consolidator {} closed {} bar at {}", self.id, self.symbol, bar.end_time());
        for indicator in &self.indicators {
            indicator.borrow_mut().update(bar.end_time(), bar.close);
        }
    }
}
