//! Summary analysis of a user's shopping patterns.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::purchase::PurchaseRecord;

/// Aggregate view of the purchase log, for dashboards and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternInsights {
    pub total_purchases: u64,
    pub unique_items: u64,
    pub categories_shopped: u64,
    pub avg_items_per_week: f64,
    /// Most purchased items with counts, highest first (top 5)
    pub top_items: Vec<(String, u64)>,
    /// Most purchased categories with counts, highest first (top 3)
    pub favorite_categories: Vec<(String, u64)>,
    /// Unique items over total purchases: 1.0 means never a repeat buy
    pub shopping_diversity: f64,
    pub first_purchase_at: Option<DateTime<Utc>>,
    pub last_purchase_at: Option<DateTime<Utc>>,
}

impl PatternInsights {
    fn empty() -> Self {
        Self {
            total_purchases: 0,
            unique_items: 0,
            categories_shopped: 0,
            avg_items_per_week: 0.0,
            top_items: Vec::new(),
            favorite_categories: Vec::new(),
            shopping_diversity: 0.0,
            first_purchase_at: None,
            last_purchase_at: None,
        }
    }
}

fn ranked_counts(counts: HashMap<String, u64>, take: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(take);
    entries
}

/// Analyze the full log. An empty log produces the explicit empty value.
pub fn analyze_patterns(log: &[PurchaseRecord]) -> PatternInsights {
    if log.is_empty() {
        return PatternInsights::empty();
    }

    let mut item_counts: HashMap<String, u64> = HashMap::new();
    let mut category_counts: HashMap<String, u64> = HashMap::new();
    let mut first = log[0].purchased_at;
    let mut last = log[0].purchased_at;

    for record in log {
        *item_counts.entry(record.normalized_name()).or_insert(0) += 1;
        *category_counts.entry(record.category.clone()).or_insert(0) += 1;
        first = first.min(record.purchased_at);
        last = last.max(record.purchased_at);
    }

    let total_purchases = log.len() as u64;
    let unique_items = item_counts.len() as u64;
    let categories_shopped = category_counts.len() as u64;

    let days_span = (last - first).num_days().max(1);
    let avg_items_per_week =
        ((total_purchases as f64 / days_span as f64) * 7.0 * 10.0).round() / 10.0;

    PatternInsights {
        total_purchases,
        unique_items,
        categories_shopped,
        avg_items_per_week,
        top_items: ranked_counts(item_counts, 5),
        favorite_categories: ranked_counts(category_counts, 3),
        shopping_diversity: unique_items as f64 / total_purchases as f64,
        first_purchase_at: Some(first),
        last_purchase_at: Some(last),
    }
}
