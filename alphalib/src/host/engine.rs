use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::data::{History, Resolution, SecurityChanges, Slice, Symbol};
use crate::errors::AlphaError;
use crate::host::{Algorithm, ConsolidatorId, HistoryStore, InsightManager, SubscriptionManager};
use crate::indicators::SharedIndicator;
use crate::models::{AlphaModel, Insight};

/// Host-side state an alpha model interacts with through [`Algorithm`].
pub struct HostAlgorithm {
    time: DateTime<Utc>,
    history: HistoryStore,
    subscriptions: SubscriptionManager,
    insights: InsightManager,
}

impl HostAlgorithm {
    pub fn new(history: HistoryStore, start: DateTime<Utc>) -> Self {
        HostAlgorithm {
            time: start,
            history,
            subscriptions: SubscriptionManager::new(),
            insights: InsightManager::new(),
        }
    }

    pub fn history_store(&self) -> &HistoryStore {
        &self.history
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn insights(&self) -> &InsightManager {
        &self.insights
    }
}

impl Algorithm for HostAlgorithm {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn history(
        &self,
        symbols: &[Symbol],
        lookback: usize,
        resolution: Resolution,
    ) -> Result<History, AlphaError> {
        self.history.history(symbols, lookback, resolution, self.time)
    }

    fn resolve_consolidator(
        &mut self,
        symbol: &Symbol,
        resolution: Resolution,
    ) -> Result<ConsolidatorId, AlphaError> {
        Ok(self.subscriptions.add_consolidator(symbol, resolution))
    }

    fn register_indicator(
        &mut self,
        symbol: &Symbol,
        indicator: SharedIndicator,
        consolidator: ConsolidatorId,
    ) -> Result<(), AlphaError> {
        self.subscriptions.register_indicator(symbol, indicator, consolidator)
    }

    fn remove_consolidator(
        &mut self,
        symbol: &Symbol,
        consolidator: ConsolidatorId,
    ) -> Result<(), AlphaError> {
        self.subscriptions.remove_consolidator(symbol, consolidator)
    }

    fn cancel_insights(&mut self, insights: &[Insight]) {
        let cancelled = self.insights.cancel(insights, self.time);
        if cancelled > 0 {
            log::info!("Cancelled {} insights at {}", cancelled, self.time);
        }
    }
}

/// Drives an alpha model: owns the clock, the universe and the host services,
/// and invokes the model's callbacks in order.
pub struct Engine {
    host: HostAlgorithm,
    alpha: Box<dyn AlphaModel>,
    universe: BTreeSet<Symbol>,
}

impl Engine {
    pub fn new(alpha: Box<dyn AlphaModel>, history: HistoryStore, start: DateTime<Utc>) -> Self {
        Engine {
            host: HostAlgorithm::new(history, start),
            alpha,
            universe: BTreeSet::new(),
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.host.time
    }

    pub fn algorithm(&self) -> &HostAlgorithm {
        &self.host
    }

    pub fn alpha_name(&self) -> &str {
        self.alpha.name()
    }

    pub fn universe(&self) -> &BTreeSet<Symbol> {
        &self.universe
    }

    pub fn insights(&self) -> &InsightManager {
        &self.host.insights
    }

    pub fn add_securities(&mut self, symbols: &[Symbol]) -> Result<(), AlphaError> {
        let added: Vec<Symbol> = symbols
            .iter()
            .filter(|symbol| self.universe.insert((*symbol).clone()))
            .cloned()
            .collect();
        if added.is_empty() {
            return Ok(());
        }

        log::info!("Adding {} securities at {}", added.len(), self.host.time);
        self.alpha
            .on_securities_changed(&mut self.host, &SecurityChanges::added(added))
    }

    pub fn remove_securities(&mut self, symbols: &[Symbol]) -> Result<(), AlphaError> {
        let removed: Vec<Symbol> = symbols
            .iter()
            .filter(|symbol| self.universe.remove(*symbol))
            .cloned()
            .collect();
        if removed.is_empty() {
            return Ok(());
        }

        log::info!("Removing {} securities at {}", removed.len(), self.host.time);
        self.alpha
            .on_securities_changed(&mut self.host, &SecurityChanges::removed(removed))
    }

    /// Advances the clock to the slice, feeds its bars to the consolidators,
    /// then asks the alpha model for insights.
    pub fn on_data(&mut self, slice: &Slice) -> Result<Vec<Insight>, AlphaError> {
        if slice.time < self.host.time {
            log::warn!("Rejecting slice at {}, clock is at {}", slice.time, self.host.time);
            return Err(AlphaError::OutOfOrderSlice {
                slice: slice.time,
                clock: self.host.time,
            });
        }

        self.host.time = slice.time;
        for bar in slice.bars.values() {
            self.host.history.append(bar.clone());
        }
        self.host.subscriptions.process(slice)?;

        let insights = self.alpha.update(&mut self.host, slice)?;
        self.host.insights.add(&insights, self.alpha.name(), slice.time);
        Ok(insights)
    }
}
