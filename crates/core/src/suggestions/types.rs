//! Types for the suggestion engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request for shopping suggestions
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    /// Items currently on the shopping list (association seeds)
    pub current_items: Vec<String>,
    /// Maximum number of suggestions to return
    pub limit: usize,
    /// Evaluation instant; passed in so results are a pure function of
    /// (log, request) and replayable in tests
    pub now: DateTime<Utc>,
}

impl SuggestionRequest {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { current_items: Vec::new(), limit: 15, now }
    }

    pub fn with_current_items(mut self, items: Vec<String>) -> Self {
        self.current_items = items;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A single ranked suggestion. Ephemeral: produced per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub item_name: String,
    pub category: String,
    /// Human-readable reason, e.g. "bought with pasta 87% of the time"
    pub reason: String,
    /// Corroboration score in [0, 1]
    pub confidence: f64,
    pub priority: Priority,
    pub signal: SuggestionSignal,
}

/// Reminder priority attached to a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Numeric rank for sorting (higher sorts first)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

/// Which mining signal produced (or dominated) a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSignal {
    /// Co-purchased with an item already on the list
    Association,
    /// The item's repurchase interval says it is due again
    Replenishment,
    /// Historically purchased in the current season
    Seasonal,
}

impl SuggestionSignal {
    pub fn description(&self) -> &'static str {
        match self {
            SuggestionSignal::Association => "Frequently bought together",
            SuggestionSignal::Replenishment => "Due for a rebuy",
            SuggestionSignal::Seasonal => "In season now",
        }
    }
}

/// One mined association rule for a query item, ready for ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub consequent: String,
    /// P(consequent | antecedent), in [0, 1]
    pub confidence: f64,
    /// Observed co-purchase rate over the rate expected under independence
    pub lift: f64,
    /// Fraction of all baskets containing the pair, in [0, 1]
    pub support: f64,
}

/// Replenishment state of an item relative to its estimated period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyStatus {
    Due,
    Overdue,
    Ok,
    /// Fewer than two purchases: no estimate exists, which is not the same
    /// as "not due"
    Unknown,
}

impl FrequencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyStatus::Due => "due",
            FrequencyStatus::Overdue => "overdue",
            FrequencyStatus::Ok => "ok",
            FrequencyStatus::Unknown => "unknown",
        }
    }
}

/// Answer to a frequency-status query for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyReport {
    pub item_name: String,
    pub estimated_period_days: Option<f64>,
    pub status: FrequencyStatus,
}

#[cfg(test)]
mod tests {
    use super::{FrequencyStatus, Priority};

    #[test]
    fn priority_ranks_order_high_first() {
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn frequency_status_labels_are_stable() {
        assert_eq!(FrequencyStatus::Due.as_str(), "due");
        assert_eq!(FrequencyStatus::Overdue.as_str(), "overdue");
        assert_eq!(FrequencyStatus::Ok.as_str(), "ok");
        assert_eq!(FrequencyStatus::Unknown.as_str(), "unknown");
    }
}
