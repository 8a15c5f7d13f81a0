use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Bar size requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[serde(alias = "Second")]
    Second,
    #[serde(alias = "Minute")]
    Minute,
    #[serde(alias = "Hour")]
    Hour,
    #[default]
    #[serde(alias = "Daily")]
    Daily,
}

impl Resolution {
    pub fn to_duration(self) -> Duration {
        match self {
            Resolution::Second => Duration::seconds(1),
            Resolution::Minute => Duration::minutes(1),
            Resolution::Hour => Duration::hours(1),
            Resolution::Daily => Duration::days(1),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Resolution::Second => "second",
            Resolution::Minute => "minute",
            Resolution::Hour => "hour",
            Resolution::Daily => "daily",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(Resolution::Second.to_duration(), Duration::seconds(1));
        assert_eq!(Resolution::Minute.to_duration(), Duration::seconds(60));
        assert_eq!(Resolution::Hour.to_duration(), Duration::minutes(60));
        assert_eq!(Resolution::Daily.to_duration(), Duration::hours(24));
    }

    #[test]
    fn deserializes_either_case() {
        let lower: Resolution = serde_json::from_str("\"daily\"").unwrap();
        let upper: Resolution = serde_json::from_str("\"Hour\"").unwrap();
        assert_eq!(lower, Resolution::Daily);
        assert_eq!(upper, Resolution::Hour);
        assert!(serde_json::from_str::<Resolution>("\"tick\"").is_err());
    }
}
