use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::data::{consolidate_bars, History, Resolution, Symbol, TradeBar};
use crate::errors::AlphaError;

/// In-memory bar storage answering the host's history requests.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    bars: BTreeMap<Symbol, Vec<TradeBar>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        HistoryStore::default()
    }

    pub fn from_bars(bars: impl IntoIterator<Item = TradeBar>) -> Self {
        let mut store = HistoryStore::new();
        for bar in bars {
            store.append(bar);
        }
        store
    }

    /// Stores a bar in time order. A bar with the same open time replaces the old one.
    pub fn append(&mut self, bar: TradeBar) {
        let series = self.bars.entry(bar.symbol.clone()).or_default();
        match series.binary_search_by_key(&bar.time, |existing| existing.time) {
            Ok(index) => series[index] = bar,
            Err(index) => series.insert(index, bar),
        }
    }

    pub fn len(&self, symbol: &Symbol) -> usize {
        self.bars.get(symbol).map_or(0, Vec::len)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.bars.keys()
    }

    pub fn latest(&self, symbol: &Symbol) -> Option<&TradeBar> {
        self.bars.get(symbol).and_then(|series| series.last())
    }

    /// Bars for `symbol` that had closed by `now`.
    pub fn closed_bars(&self, symbol: &Symbol, now: DateTime<Utc>) -> &[TradeBar] {
        let series = match self.bars.get(symbol) {
            Some(series) => series,
            None => return &[],
        };
        let end = series.partition_point(|bar| bar.end_time() <= now);
        &series[..end]
    }

    /// The last `lookback` bars at `resolution` that closed by `now`, for each
    /// requested symbol with data. Finer bars are consolidated on the way out.
    pub fn history(
        &self,
        symbols: &[Symbol],
        lookback: usize,
        resolution: Resolution,
        now: DateTime<Utc>,
    ) -> Result<History, AlphaError> {
        let mut history = History::new();
        for symbol in symbols {
            let closed = self.closed_bars(symbol, now);
            if closed.is_empty() {
                continue;
            }
            let bars = consolidate_bars(closed, resolution.to_duration())?;
            let skip = bars.len().saturating_sub(lookback);
            history.insert(symbol.clone(), bars.into_iter().skip(skip).collect());
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar(ticker: &str, time: DateTime<Utc>, period: Duration, close: f64) -> TradeBar {
        TradeBar {
            symbol: Symbol::new(ticker),
            time,
            period,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn returns_last_lookback_closed_bars() {
        let store = HistoryStore::from_bars(
            (0..10).map(|d| bar("EUR_USD", start() + Duration::days(d), Duration::days(1), d as f64)),
        );

        // bars for days 0..=4 have closed by the start of day 5
        let now = start() + Duration::days(5);
        let history = store
            .history(&[Symbol::new("EUR_USD")], 3, Resolution::Daily, now)
            .unwrap();
        let closes: Vec<f64> = history
            .get(&Symbol::new("EUR_USD"))
            .unwrap()
            .iter()
            .map(|b| b.close)
            .collect();
        assert_eq!(closes, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn symbols_without_data_are_absent() {
        let store = HistoryStore::from_bars(vec![bar("EUR_USD", start(), Duration::days(1), 1.0)]);
        let history = store
            .history(
                &[Symbol::new("EUR_USD"), Symbol::new("GBP_USD")],
                5,
                Resolution::Daily,
                start() + Duration::days(1),
            )
            .unwrap();

        assert_eq!(history.symbols().count(), 1);
        assert!(history.get(&Symbol::new("GBP_USD")).is_none());

        let before = store
            .history(&[Symbol::new("EUR_USD")], 5, Resolution::Daily, start())
            .unwrap();
        assert!(before.is_empty());
    }

    #[test]
    fn consolidates_finer_bars() {
        let store = HistoryStore::from_bars(
            (0..48).map(|h| bar("EUR_USD", start() + Duration::hours(h), Duration::hours(1), h as f64)),
        );
        let history = store
            .history(&[Symbol::new("EUR_USD")], 10, Resolution::Daily, start() + Duration::days(2))
            .unwrap();
        let bars = history.get(&Symbol::new("EUR_USD")).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 47.0);
        assert_eq!(bars[1].period, Duration::days(1));
    }

    #[test]
    fn append_keeps_order_and_replaces_duplicates() {
        let mut store = HistoryStore::new();
        store.append(bar("EUR_USD", start() + Duration::days(2), Duration::days(1), 3.0));
        store.append(bar("EUR_USD", start(), Duration::days(1), 1.0));
        store.append(bar("EUR_USD", start() + Duration::days(1), Duration::days(1), 2.0));
        store.append(bar("EUR_USD", start() + Duration::days(2), Duration::days(1), 3.5));

        let eur = Symbol::new("EUR_USD");
        assert_eq!(store.len(&eur), 3);
        assert_eq!(store.latest(&eur).map(|b| b.close), Some(3.5));
        assert_eq!(store.closed_bars(&eur, start() + Duration::days(2)).len(), 2);
    }
}
