use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::Insight;

/// The host's ledger of every insight it has accepted.
#[derive(Debug, Default)]
pub struct InsightManager {
    insights: Vec<Insight>,
    cancelled: HashSet<u64>,
}

impl InsightManager {
    pub fn new() -> Self {
        InsightManager::default()
    }

    /// Accepts insights produced at `now`, filling in whatever the model left unset.
    pub fn add(&mut self, insights: &[Insight], source_model: &str, now: DateTime<Utc>) {
        for insight in insights {
            let mut insight = insight.clone();
            if insight.generated_time_utc.is_none() {
                insight.generated_time_utc = Some(now);
            }
            if insight.close_time_utc.is_none() {
                insight.close_time_utc = Some(now + insight.period);
            }
            if insight.source_model.is_none() {
                insight.source_model = Some(source_model.to_string());
            }
            self.insights.push(insight);
        }
    }

    /// Closes each still-active insight with a matching id at `now`.
    /// Returns how many were actually cancelled.
    pub fn cancel(&mut self, insights: &[Insight], now: DateTime<Utc>) -> usize {
        let ids: HashSet<u64> = insights.iter().map(|insight| insight.id).collect();
        let mut count = 0;
        for insight in self.insights.iter_mut() {
            if ids.contains(&insight.id) && insight.is_active(now) {
                insight.close_time_utc = Some(now);
                self.cancelled.insert(insight.id);
                count += 1;
            }
        }
        count
    }

    pub fn active(&self, now: DateTime<Utc>) -> Vec<&Insight> {
        self.insights.iter().filter(|insight| insight.is_active(now)).collect()
    }

    pub fn all(&self) -> &[Insight] {
        &self.insights
    }

    pub fn is_cancelled(&self, id: u64) -> bool {
        self.cancelled.contains(&id)
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.len()
    }
}
