use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::data::{Symbol, TradeBar};

/// All bars the host delivers at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub time: DateTime<Utc>,
    pub bars: BTreeMap<Symbol, TradeBar>,
}

impl Slice {
    pub fn new(time: DateTime<Utc>) -> Self {
        Slice {
            time,
            bars: BTreeMap::new(),
        }
    }

    pub fn with_bar(mut self, bar: TradeBar) -> Self {
        self.bars.insert(bar.symbol.clone(), bar);
        self
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&TradeBar> {
        self.bars.get(symbol)
    }
}

/// Universe additions and removals reported to the alpha model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityChanges {
    pub added: Vec<Symbol>,
    pub removed: Vec<Symbol>,
}

impl SecurityChanges {
    pub fn added(symbols: Vec<Symbol>) -> Self {
        SecurityChanges {
            added: symbols,
            removed: Vec::new(),
        }
    }

    pub fn removed(symbols: Vec<Symbol>) -> Self {
        SecurityChanges {
            added: Vec::new(),
            removed: symbols,
        }
    }}
