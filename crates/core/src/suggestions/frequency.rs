//! Per-item repurchase-interval estimation.
//!
//! The estimate is the median of inter-purchase gaps. Median, not mean: one
//! bulk purchase before a holiday should not halve an item's period.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::SuggestionsConfig;
use crate::domain::purchase::{normalize_item_name, PurchaseRecord};

use super::types::FrequencyStatus;

/// Observed purchase cadence for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyProfile {
    pub item_name: String,
    pub category: String,
    /// Whole-day gaps between consecutive purchases, oldest first
    pub observed_intervals: Vec<i64>,
    /// Median gap; None below two purchases
    pub estimated_period_days: Option<f64>,
    pub last_purchased_at: DateTime<Utc>,
}

impl FrequencyProfile {
    /// Replenishment state at `now`. Overdue once the gap since the last
    /// purchase exceeds `overdue_factor` times the period, due once it
    /// reaches the period, unknown without an estimate.
    pub fn status(&self, now: DateTime<Utc>, config: &SuggestionsConfig) -> FrequencyStatus {
        let Some(period) = self.estimated_period_days else {
            return FrequencyStatus::Unknown;
        };

        let days_since_last = (now - self.last_purchased_at).num_days() as f64;
        if days_since_last > config.overdue_factor * period {
            FrequencyStatus::Overdue
        } else if days_since_last >= period {
            FrequencyStatus::Due
        } else {
            FrequencyStatus::Ok
        }
    }
}

fn median(sorted: &[i64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    }
}

/// Build cadence profiles for every item in the log.
pub fn frequency_profiles(log: &[PurchaseRecord]) -> HashMap<String, FrequencyProfile> {
    let mut timestamps: HashMap<String, Vec<DateTime<Utc>>> = HashMap::new();
    let mut categories: HashMap<String, String> = HashMap::new();

    for record in log {
        let name = record.normalized_name();
        categories.insert(name.clone(), record.category.clone());
        timestamps.entry(name).or_default().push(record.purchased_at);
    }

    timestamps
        .into_iter()
        .map(|(item_name, mut purchased)| {
            purchased.sort();
            let last_purchased_at = *purchased.last().expect("entry implies one purchase");

            let mut observed_intervals: Vec<i64> = purchased
                .windows(2)
                .map(|window| (window[1] - window[0]).num_days())
                .collect();
            observed_intervals.sort_unstable();

            let estimated_period_days =
                (!observed_intervals.is_empty()).then(|| median(&observed_intervals));

            let category = categories.remove(&item_name).unwrap_or_default();
            let profile = FrequencyProfile {
                item_name: item_name.clone(),
                category,
                observed_intervals,
                estimated_period_days,
                last_purchased_at,
            };
            (item_name, profile)
        })
        .collect()
}

/// Profile for a single item, if it appears in the log at all.
pub fn profile_for(item: &str, log: &[PurchaseRecord]) -> Option<FrequencyProfile> {
    frequency_profiles(log).remove(&normalize_item_name(item))
}
