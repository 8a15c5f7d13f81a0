use std::fmt;

use crate::data::{Resolution, Symbol, TradeBar};
use crate::errors::AlphaError;
use crate::host::{Algorithm, ConsolidatorId};
use crate::indicators::SharedIndicator;

const TRADING_DAYS_PER_YEAR: i32 = 252;

/// Per-symbol state: the return indicator, the consolidator feeding it, and
/// the sample count seen at the last emission check.
pub struct SymbolData {
    symbol: Symbol,
    indicator: SharedIndicator,
    consolidator: Option<ConsolidatorId>,
    previous: u64,
}

impl SymbolData {
    pub fn new(symbol: Symbol, indicator: SharedIndicator) -> Self {
        SymbolData {
            symbol,
            indicator,
            consolidator: None,
            previous: 0,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn consolidator(&self) -> Option<ConsolidatorId> {
        self.consolidator
    }

    pub fn indicator(&self) -> &SharedIndicator {
        &self.indicator
    }

    pub fn register_indicators(
        &mut self,
        algorithm: &mut dyn Algorithm,
        resolution: Resolution,
    ) -> Result<(), AlphaError> {
        let consolidator = algorithm.resolve_consolidator(&self.symbol, resolution)?;
        self.consolidator = Some(consolidator);
        algorithm.register_indicator(&self.symbol, self.indicator.clone(), consolidator)
    }

    pub fn remove_consolidators(&mut self, algorithm: &mut dyn Algorithm) -> Result<(), AlphaError> {
        if let Some(consolidator) = self.consolidator.take() {
            algorithm.remove_consolidator(&self.symbol, consolidator)?;
        }
        Ok(())
    }

    /// Replays historical closes through the indicator, oldest first, stamped
    /// with each bar's close time as the consolidator would.
    pub fn warm_up_indicators(&mut self, history: &[TradeBar]) {
        let mut indicator = self.indicator.borrow_mut();
        for bar in history {
            indicator.update(bar.end_time(), bar.close);
        }
    }

    pub fn current_return(&self) -> f64 {
        self.indicator.borrow().current().value
    }

    /// True once per new indicator sample, provided the indicator is ready.
    /// The sample is consumed even when the indicator is not ready yet.
    pub fn can_emit(&mut self) -> bool {
        let indicator = self.indicator.borrow();
        if self.previous == indicator.samples() {
            return false;
        }

        self.previous = indicator.samples();
        indicator.is_ready()
    }
}

impl fmt::Display for SymbolData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let indicator = self.indicator.borrow();
        let annualized = (1.0 + indicator.current().value).powi(TRADING_DAYS_PER_YEAR) - 1.0;
        write!(f, "{}: {:.2}%", indicator.name(), annualized * 100.0)
    }
}
