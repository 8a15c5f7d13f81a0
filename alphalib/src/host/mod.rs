use std::fmt;

use chrono::{DateTime, Utc};

use crate::data::{History, Resolution, Symbol};
use crate::errors::AlphaError;
use crate::indicators::SharedIndicator;
use crate::models::Insight;

pub mod consolidator;
pub mod engine;
pub mod history_store;
pub mod insight_manager;
pub mod subscription_manager;

pub use consolidator::*;
pub use engine::*;
pub use history_store::*;
pub use insight_manager::*;
pub use subscription_manager::*;

/// Handle to a consolidator owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsolidatorId(pub u64);

impl fmt::Display for ConsolidatorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The services an alpha model may ask of the algorithm hosting it.
pub trait Algorithm {
    fn time(&self) -> DateTime<Utc>;

    /// The last `lookback` bars at `resolution` for each requested symbol that has data.
    fn history(
        &self,
        symbols: &[Symbol],
        lookback: usize,
        resolution: Resolution,
    ) -> Result<History, AlphaError>;

    fn resolve_consolidator(
        &mut self,
        symbol: &Symbol,
        resolution: Resolution,
    ) -> Result<ConsolidatorId, AlphaError>;

    /// Makes the host feed every bar the consolidator emits into `indicator`.
    fn register_indicator(
        &mut self,
        symbol: &Symbol,
        indicator: SharedIndicator,
        consolidator: ConsolidatorId,
    ) -> Result<(), AlphaError>;

    fn remove_consolidator(
        &mut self,
        symbol: &Symbol,
        consolidator: ConsolidatorId,
    ) -> Result<(), AlphaError>;

    fn cancel_insights(&mut self, insights: &[Insight]);
}
