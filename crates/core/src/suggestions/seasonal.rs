//! Seasonal purchase-affinity model.
//!
//! Buckets purchases by meteorological season and flags items whose history
//! concentrates in the current one. Thin histories are suppressed entirely:
//! three strawberry purchases in one June say nothing yet.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SuggestionsConfig;
use crate::domain::purchase::PurchaseRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn of(instant: DateTime<Utc>) -> Self {
        Self::from_month(instant.month())
    }

    fn index(self) -> usize {
        match self {
            Season::Winter => 0,
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Fall => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

/// Distribution of one item's purchases across the four seasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonalProfile {
    pub item_name: String,
    pub category: String,
    pub total_purchases: u64,
    season_counts: [u64; 4],
}

impl SeasonalProfile {
    /// Fraction of this item's purchases falling in `season`.
    pub fn share(&self, season: Season) -> f64 {
        if self.total_purchases == 0 {
            return 0.0;
        }
        self.season_counts[season.index()] as f64 / self.total_purchases as f64
    }

    /// True when the item's history concentrates in `season` strongly
    /// enough to claim seasonality. Requires the minimum purchase count;
    /// below it this is always false, regardless of clustering.
    pub fn in_season(&self, season: Season, config: &SuggestionsConfig) -> bool {
        self.total_purchases >= config.seasonal_min_purchases
            && self.share(season) >= config.seasonal_share_threshold
    }
}

/// Seasonal distribution per item over the full log.
pub fn seasonal_profiles(log: &[PurchaseRecord]) -> HashMap<String, SeasonalProfile> {
    let mut profiles: HashMap<String, SeasonalProfile> = HashMap::new();

    for record in log {
        let name = record.normalized_name();
        let profile = profiles.entry(name.clone()).or_insert_with(|| SeasonalProfile {
            item_name: name,
            category: record.category.clone(),
            total_purchases: 0,
            season_counts: [0; 4],
        });
        profile.category = record.category.clone();
        profile.total_purchases += 1;
        profile.season_counts[Season::of(record.purchased_at).index()] += 1;
    }

    profiles
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    use crate::config::SuggestionsConfig;
    use crate::domain::purchase::{PurchaseRecord, PurchaseRecordId};

    use super::{seasonal_profiles, Season, SeasonalProfile};

    fn profile_for(item: &str, log: &[crate::domain::purchase::PurchaseRecord]) -> Option<SeasonalProfile> {
        seasonal_profiles(log).remove(item)
    }

    fn at(date: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{date}T12:00:00Z")).expect("date").to_utc()
    }

    fn record(item: &str, date: &str) -> PurchaseRecord {
        PurchaseRecord {
            id: PurchaseRecordId(format!("p-{item}-{date}")),
            user_id: "default".to_string(),
            item_name: item.to_string(),
            category: "fruits".to_string(),
            quantity: 1,
            unit_price: Decimal::new(450, 2),
            purchased_at: at(date),
        }
    }

    #[test]
    fn months_map_to_seasons() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(4), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(10), Season::Fall);
    }

    #[test]
    fn concentrated_history_is_in_season() {
        let config = SuggestionsConfig::default();
        // 4 of 5 strawberry purchases in summer: share 0.8.
        let log = vec![
            record("strawberries", "2024-06-10"),
            record("strawberries", "2024-07-02"),
            record("strawberries", "2025-06-20"),
            record("strawberries", "2025-08-01"),
            record("strawberries", "2025-01-15"),
        ];

        let profile = profile_for("strawberries", &log).expect("profile");
        assert!((profile.share(Season::Summer) - 0.8).abs() < 1e-9);
        assert!(profile.in_season(Season::Summer, &config));
        assert!(!profile.in_season(Season::Winter, &config));
    }

    #[test]
    fn thin_history_is_suppressed_even_when_clustered() {
        let config = SuggestionsConfig::default();
        // All three purchases in summer, but three is below the minimum.
        let log = vec![
            record("peaches", "2025-06-10"),
            record("peaches", "2025-07-01"),
            record("peaches", "2025-08-12"),
        ];

        let profile = profile_for("peaches", &log).expect("profile");
        assert_eq!(profile.share(Season::Summer), 1.0);
        assert!(!profile.in_season(Season::Summer, &config));
    }

    #[test]
    fn uniform_history_is_never_in_season() {
        let config = SuggestionsConfig::default();
        let log = vec![
            record("milk", "2025-01-10"),
            record("milk", "2025-04-10"),
            record("milk", "2025-07-10"),
            record("milk", "2025-10-10"),
        ];

        let profile = profile_for("milk", &log).expect("profile");
        for season in [Season::Winter, Season::Spring, Season::Summer, Season::Fall] {
            assert!((profile.share(season) - 0.25).abs() < 1e-9);
            assert!(!profile.in_season(season, &config));
        }
    }

    #[test]
    fn share_at_threshold_counts() {
        let config = SuggestionsConfig::default();
        // 3 of 8 = 0.375, exactly the threshold.
        let mut log = Vec::new();
        for date in ["2024-12-05", "2025-01-06", "2025-02-07"] {
            log.push(record("oranges", date));
        }
        for date in ["2025-04-01", "2025-05-01", "2025-07-01", "2025-09-01", "2025-10-01"] {
            log.push(record("oranges", date));
        }

        let profile = profile_for("oranges", &log).expect("profile");
        assert!(profile.in_season(Season::Winter, &config));
    }
}
