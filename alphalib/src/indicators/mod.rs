use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};

pub mod factory;
pub mod mean_return;
pub mod rate_of_change;
pub mod rolling_window;

pub use factory::*;
pub use mean_return::*;
pub use rate_of_change::*;
pub use rolling_window::*;

/// The latest output of an indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorDataPoint {
    pub time: Option<DateTime<Utc>>,
    pub value: f64,
}

impl Default for IndicatorDataPoint {
    fn default() -> Self {
        IndicatorDataPoint {
            time: None,
            value: 0.0,
        }
    }
}

pub trait Indicator {
    fn name(&self) -> &str;

    /// Feeds one observation and returns whether the indicator is ready.
    fn update(&mut self, time: DateTime<Utc>, value: f64) -> bool;

    fn current(&self) -> IndicatorDataPoint;

    /// Number of observations fed since construction or the last reset.
    fn samples(&self) -> u64;

    fn is_ready(&self) -> bool;

    /// Observations required before `is_ready` turns true.
    fn warm_up_period(&self) -> usize;

    fn reset(&mut self);
}

/// An indicator owned jointly by an alpha model (which reads it) and the
/// host consolidator that feeds it.
pub type SharedIndicator = Rc<RefCell<dyn Indicator>>;

pub fn shared<I: Indicator + 'static>(indicator: I) -> SharedIndicator {
    Rc::new(RefCell::new(indicator))
}
