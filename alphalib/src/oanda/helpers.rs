use chrono::{DateTime, Utc};

pub fn deserialize_f64_from_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: &str = serde::Deserialize::deserialize(deserializer)?;
    s.parse::<f64>().map_err(serde::de::Error::custom)
}

// OANDA timestamps are RFC3339 with nanoseconds: "2023-09-15T20:58:00.145575162Z"
pub fn deserialize_datetime_from_string<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: &str = serde::Deserialize::deserialize(deserializer)?;
    let datetime = DateTime::parse_from_rfc3339(s)
        .map_err(|e| serde::de::Error::custom(format!("Failed to parse datetime: {}", e)))?;
    Ok(datetime.with_timezone(&Utc))
}
