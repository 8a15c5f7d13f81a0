use chrono::{DateTime, Utc};

use crate::indicators::{Indicator, IndicatorDataPoint, RollingWindow};

/// Mean of the last `period` one-step simple returns.
#[derive(Debug, Clone)]
pub struct MeanReturn {
    name: String,
    period: usize,
    previous: Option<f64>,
    returns: RollingWindow<f64>,
    sum: f64,
    current: IndicatorDataPoint,
    samples: u64,
}

impl MeanReturn {
    pub fn new(name: impl Into<String>, period: usize) -> Self {
        let period = period.max(1);
        MeanReturn {
            name: name.into(),
            period,
            previous: None,
            returns: RollingWindow::new(period),
            sum: 0.0,
            current: IndicatorDataPoint::default(),
            samples: 0,
        }
    }
}

impl Indicator for MeanReturn {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, time: DateTime<Utc>, value: f64) -> bool {
        self.samples += 1;

        if let Some(previous) = self.previous {
            let step = if previous != 0.0 {
                (value - previous) / previous
            } else {
                0.0
            };
            if let Some(evicted) = self.returns.push(step) {
                self.sum -= evicted;
            }
            self.sum += step;
        }
        self.previous = Some(value);

        let value = if self.returns.is_full() {
            self.sum / self.period as f64
        } else {
            0.0
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
        self.returns.is_full()
    }

    fn warm_up_period(&self) -> usize {
        self.period + 1
    }

    fn reset(&mut self) {
        self.previous = None;
        self.returns.clear();
        self.sum = 0.0;
        self.current = IndicatorDataPoint::default();
        self.samples = 0;
    }
}
