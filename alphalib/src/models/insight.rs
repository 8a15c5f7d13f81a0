use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Symbol;

static NEXT_INSIGHT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightDirection {
    Up,
    Down,
    Flat,
}

impl InsightDirection {
    /// Positive is up, negative is down; zero and NaN are flat.
    pub fn from_magnitude(magnitude: f64) -> Self {
        if magnitude > 0.0 {
            InsightDirection::Up
        } else if magnitude < 0.0 {
            InsightDirection::Down
        } else {
            InsightDirection::Flat
        }
    }
}

impl fmt::Display for InsightDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            InsightDirection::Up => "up",
            InsightDirection::Down => "down",
            InsightDirection::Flat => "flat",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Price,
}

/// A directional forecast for one symbol, valid for `period`.
///
/// The alpha model stamps generated/close times when it emits; the host fills
/// in the source model and any time still unset when it accepts the insight.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub id: u64,
    pub symbol: Symbol,
    pub kind: InsightType,
    pub direction: InsightDirection,
    pub period: Duration,
    pub magnitude: Option<f64>,
    pub confidence: Option<f64>,
    pub source_model: Option<String>,
    pub generated_time_utc: Option<DateTime<Utc>>,
    pub close_time_utc: Option<DateTime<Utc>>,
}

impl Insight {
    pub fn price(
        symbol: Symbol,
        period: Duration,
        direction: InsightDirection,
        magnitude: Option<f64>,
        confidence: Option<f64>,
    ) -> Self {
        Insight {
            id: NEXT_INSIGHT_ID.fetch_add(1, Ordering::Relaxed),
            symbol,
            kind: InsightType::Price,
            direction,
            period,
            magnitude,
            confidence,
            source_model: None,
            generated_time_utc: None,
            close_time_utc: None,
        }
    }

    /// Sets the generated time and closes the insight one period later.
    pub fn with_generated_time(mut self, now: DateTime<Utc>) -> Self {
        self.generated_time_utc = Some(now);
        self.close_time_utc = Some(now + self.period);
        self
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.close_time_utc {
            Some(close) => close > now,
            None => true,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_active(now)
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {} {}", self.id, self.symbol, self.direction)?;
        if let Some(magnitude) = self.magnitude {
            write!(f, " {:.4}%", magnitude * 100.0)?;
        }
        write!(f, " for {}s", self.period.num_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn direction_follows_sign() {
        assert_eq!(InsightDirection::from_magnitude(0.01), InsightDirection::Up);
        assert_eq!(InsightDirection::from_magnitude(-1e-9), InsightDirection::Down);
        assert_eq!(InsightDirection::from_magnitude(0.0), InsightDirection::Flat);
        assert_eq!(InsightDirection::from_magnitude(-0.0), InsightDirection::Flat);
        assert_eq!(InsightDirection::from_magnitude(f64::NAN), InsightDirection::Flat);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = Insight::price(Symbol::new("A"), Duration::days(1), InsightDirection::Up, None, None);
        let b = Insight::price(Symbol::new("A"), Duration::days(1), InsightDirection::Up, None, None);
        assert!(b.id > a.id);
    }

    #[test]
    fn active_until_close_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut insight =
            Insight::price(Symbol::new("A"), Duration::days(1), InsightDirection::Down, Some(-0.02), None);
        assert!(insight.is_active(now));

        insight.close_time_utc = Some(now + Duration::days(1));
        assert!(insight.is_active(now + Duration::hours(23)));
        assert!(insight.is_expired(now + Duration::days(1)));
    }
}
