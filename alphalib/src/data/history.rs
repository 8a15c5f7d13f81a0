use std::collections::BTreeMap;

use crate::data::{Symbol, TradeBar};

/// Historical bars keyed by symbol, each series in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    bars: BTreeMap<Symbol, Vec<TradeBar>>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    pub fn insert(&mut self, symbol: Symbol, bars: Vec<TradeBar>) {
        if bars.is_empty() {
            return;
        }
        self.bars.insert(symbol, bars);
    }

    /// True when no symbol has a single bar.
    pub fn is_empty(&self) -> bool {
        self.bars.values().all(|bars| bars.is_empty())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.bars.keys()
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&[TradeBar]> {
        self.bars.get(symbol).map(|bars| bars.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &[TradeBar])> {
        self.bars.iter().map(|(symbol, bars)| (symbol, bars.as_slice()))
    }
}
