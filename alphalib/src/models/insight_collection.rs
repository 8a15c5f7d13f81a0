use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::data::Symbol;
use crate::models::Insight;

/// Insights an alpha model has emitted, grouped by symbol.
#[derive(Debug, Clone, Default)]
pub struct InsightCollection {
    insights: BTreeMap<Symbol, Vec<Insight>>,
}

impl InsightCollection {
    pub fn new() -> Self {
        InsightCollection::default()
    }

    pub fn add(&mut self, insight: Insight) {
        self.insights
            .entry(insight.symbol.clone())
            .or_default()
            .push(insight);
    }

    pub fn add_range(&mut self, insights: impl IntoIterator<Item = Insight>) {
        for insight in insights {
            self.add(insight);
        }
    }

    pub fn contains_key(&self, symbol: &Symbol) -> bool {
        self.insights.contains_key(symbol)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&[Insight]> {
        self.insights.get(symbol).map(|insights| insights.as_slice())
    }

    pub fn clear(&mut self, symbols: &[Symbol]) {
        for symbol in symbols {
            self.insights.remove(symbol);
        }
    }

    /// Drops insights whose close time has passed, returning them.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> Vec<Insight> {
        let mut expired = Vec::new();
        for insights in self.insights.values_mut() {
            let (gone, kept): (Vec<Insight>, Vec<Insight>) =
                insights.drain(..).partition(|insight| insight.is_expired(now));
            expired.extend(gone);
            *insights = kept;
        }
        self.insights.retain(|_, insights| !insights.is_empty());
        expired
    }

    /// Total number of insights across all symbols.
    pub fn len(&self) -> usize {
        self.insights.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }
}
