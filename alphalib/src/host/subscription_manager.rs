use std::collections::BTreeMap;

use crate::data::{Resolution, Slice, Symbol};
use crate::errors::AlphaError;
use crate::host::{ConsolidatorId, TradeBarConsolidator};
use crate::indicators::SharedIndicator;

/// Owns every consolidator and routes incoming bars to the ones subscribed
/// to each symbol.
#[derive(Default)]
pub struct SubscriptionManager {
    next_id: u64,
    consolidators: BTreeMap<ConsolidatorId, TradeBarConsolidator>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        SubscriptionManager::default()
    }

    pub fn add_consolidator(&mut self, symbol: &Symbol, resolution: Resolution) -> ConsolidatorId {
        self.next_id += 1;
        let id = ConsolidatorId(self.next_id);
        let consolidator = TradeBarConsolidator::new(id, symbol.clone(), resolution.to_duration());
        self.consolidators.insert(id, consolidator);
        log::debug!("Added {} consolidator {} for {}", resolution, id, symbol);
        id
    }

    pub fn register_indicator(
        &mut self,
        symbol: &Symbol,
        indicator: SharedIndicator,
        id: ConsolidatorId,
    ) -> Result<(), AlphaError> {
        let consolidator = self.find_mut(symbol, id)?;
        consolidator.register(indicator);
        Ok(())
    }

    pub fn remove_consolidator(&mut self, symbol: &Symbol, id: ConsolidatorId) -> Result<(), AlphaError> {
        self.find_mut(symbol, id)?;
        self.consolidators.remove(&id);
        log::debug!("Removed consolidator {} for {}", id, symbol);
        Ok(())
    }

    /// Feeds each bar of the slice through the consolidators of its symbol.
    pub fn process(&mut self, slice: &Slice) -> Result<(), AlphaError> {
        for consolidator in self.consolidators.values_mut() {
            if let Some(bar) = slice.get(consolidator.symbol()) {
                consolidator.update(bar)?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: ConsolidatorId) -> bool {
        self.consolidators.contains_key(&id)
    }

    pub fn count_for(&self, symbol: &Symbol) -> usize {
        self.consolidators
            .values()
            .filter(|consolidator| consolidator.symbol() == symbol)
            .count()
    }

    pub fn len(&self) -> usize {
        self.consolidators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consolidators.is_empty()
    }

    fn find_mut(&mut self, symbol: &Symbol, id: ConsolidatorId) -> Result<&mut TradeBarConsolidator, AlphaError> {
        match self.consolidators.get_mut(&id) {
            Some(consolidator) if consolidator.symbol() == symbol => Ok(consolidator),
            _ => Err(AlphaError::UnknownConsolidator {
                symbol: symbol.clone(),
                id,
            }),
        }
    }
}
