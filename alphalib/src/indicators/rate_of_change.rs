use chrono::{DateTime, Utc};

use crate::indicators::{Indicator, IndicatorDataPoint, RollingWindow};

/// Historical return over `period` observations: `(v_t - v_{t-period}) / v_{t-period}`.
#[derive(Debug, Clone)]
pub struct RateOfChange {
    name: String,
    period: usize,
    window: RollingWindow<f64>,
    current: IndicatorDataPoint,
    samples: u64,
}

impl RateOfChange {
    pub fn new(name: impl Into<String>, period: usize) -> Self {
        let period = period.max(1);
        RateOfChange {
            name: name.into(),
            period,
            window: RollingWindow::new(period + 1),
            current: IndicatorDataPoint::default(),
            samples: 0,
        }
    }
}

impl Indicator for RateOfChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, time: DateTime<Utc>, value: f64) -> bool {
        self.samples += 1;
        self.window.push(value);

        let value = match (self.window.is_full(), self.window.oldest()) {
            (true, Some(&base)) if base != 0.0 => (value - base) / base,
            _ => 0.0,
        };
        self.current = IndicatorDataPoint {
            time: Some(time),
            value,
        };
        self.is_ready()
    }

    fn current(&self) -> IndicatorDataPoint {
        self.current
    }

    fn samples(&self) -> u64 {
        self.samples
    }

    fn is_ready(&self) -> bool {
        self.window.is_full()
    }

    fn warm_up_period(&self) -> usize {
        self.period + 1
    }

    fn reset(&mut self) {
        self.window.clear();
        self.current = IndicatorDataPoint::default();
        self.samples = 0;
    }
}
