//! Market-basket association mining over the purchase log.
//!
//! A basket is one user's purchases on one UTC calendar day. Counts are
//! presence-based: buying three jars of sauce in one trip contributes one
//! co-occurrence, not three.

use std::collections::{BTreeSet, HashMap};

use crate::domain::purchase::{normalize_item_name, PurchaseRecord};

use super::types::AssociationRule;

/// Raw pairwise counts for one item pair. Derived from the log on demand,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAssociation {
    pub antecedent: String,
    pub consequent: String,
    pub co_occurrence_count: u64,
    pub antecedent_count: u64,
    pub consequent_count: u64,
    pub total_baskets: u64,
}

impl ItemAssociation {
    /// P(consequent | antecedent). None when the antecedent never appears
    /// in any basket.
    pub fn confidence(&self) -> Option<f64> {
        (self.antecedent_count > 0)
            .then(|| self.co_occurrence_count as f64 / self.antecedent_count as f64)
    }

    pub fn support(&self) -> Option<f64> {
        (self.total_baskets > 0)
            .then(|| self.co_occurrence_count as f64 / self.total_baskets as f64)
    }

    pub fn lift(&self) -> Option<f64> {
        let confidence = self.confidence()?;
        if self.consequent_count == 0 || self.total_baskets == 0 {
            return None;
        }
        let consequent_rate = self.consequent_count as f64 / self.total_baskets as f64;
        Some(confidence / consequent_rate)
    }
}

/// Co-occurrence index over a log snapshot. Building it is the only pass
/// over the data; every query afterwards is a lookup.
#[derive(Debug, Clone, Default)]
pub struct AssociationIndex {
    total_baskets: u64,
    item_baskets: HashMap<String, u64>,
    pair_baskets: HashMap<(String, String), u64>,
    categories: HashMap<String, String>,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl AssociationIndex {
    pub fn build(log: &[PurchaseRecord]) -> Self {
        let mut baskets: HashMap<(String, chrono::NaiveDate), BTreeSet<String>> = HashMap::new();
        let mut categories = HashMap::new();

        for record in log {
            let name = record.normalized_name();
            categories.insert(name.clone(), record.category.clone());
            baskets
                .entry((record.user_id.clone(), record.purchased_at.date_naive()))
                .or_default()
                .insert(name);
        }

        let mut item_baskets: HashMap<String, u64> = HashMap::new();
        let mut pair_baskets: HashMap<(String, String), u64> = HashMap::new();

        for basket in baskets.values() {
            for item in basket {
                *item_baskets.entry(item.clone()).or_insert(0) += 1;
            }

            let items: Vec<&String> = basket.iter().collect();
            for (index, first) in items.iter().enumerate() {
                for second in &items[index + 1..] {
                    *pair_baskets.entry(pair_key(first, second)).or_insert(0) += 1;
                }
            }
        }

        Self { total_baskets: baskets.len() as u64, item_baskets, pair_baskets, categories }
    }

    pub fn total_baskets(&self) -> u64 {
        self.total_baskets
    }

    pub fn baskets_with(&self, item: &str) -> u64 {
        self.item_baskets.get(&normalize_item_name(item)).copied().unwrap_or(0)
    }

    /// Symmetric raw co-occurrence count for a pair.
    pub fn co_occurrence(&self, a: &str, b: &str) -> u64 {
        let key = pair_key(&normalize_item_name(a), &normalize_item_name(b));
        self.pair_baskets.get(&key).copied().unwrap_or(0)
    }

    /// Category last observed for an item, if it ever appears in the log.
    pub fn category_of(&self, item: &str) -> Option<&str> {
        self.categories.get(&normalize_item_name(item)).map(String::as_str)
    }

    pub fn association(&self, antecedent: &str, consequent: &str) -> Option<ItemAssociation> {
        let antecedent = normalize_item_name(antecedent);
        let consequent = normalize_item_name(consequent);
        let co_occurrence_count = self.co_occurrence(&antecedent, &consequent);
        if co_occurrence_count == 0 {
            return None;
        }

        Some(ItemAssociation {
            antecedent_count: self.baskets_with(&antecedent),
            consequent_count: self.baskets_with(&consequent),
            antecedent,
            consequent,
            co_occurrence_count,
            total_baskets: self.total_baskets,
        })
    }

    /// Ranked rules for one antecedent: confidence desc, lift desc, then
    /// consequent name asc so unchanged input yields unchanged output.
    /// Pairs seen in fewer than `min_pair_baskets` baskets are dropped as
    /// sparse-history noise.
    pub fn rules_for(&self, antecedent: &str, min_pair_baskets: u64) -> Vec<AssociationRule> {
        let antecedent = normalize_item_name(antecedent);
        let antecedent_baskets = self.baskets_with(&antecedent);
        if antecedent_baskets == 0 || self.total_baskets == 0 {
            return Vec::new();
        }

        let mut rules: Vec<AssociationRule> = self
            .pair_baskets
            .iter()
            .filter_map(|((first, second), &count)| {
                let consequent = if *first == antecedent {
                    second
                } else if *second == antecedent {
                    first
                } else {
                    return None;
                };

                if count < min_pair_baskets {
                    return None;
                }

                let consequent_baskets = self.baskets_with(consequent);
                if consequent_baskets == 0 {
                    return None;
                }

                let confidence = count as f64 / antecedent_baskets as f64;
                let support = count as f64 / self.total_baskets as f64;
                let consequent_rate = consequent_baskets as f64 / self.total_baskets as f64;
                let lift = confidence / consequent_rate;

                Some(AssociationRule { consequent: consequent.clone(), confidence, lift, support })
            })
            .collect();

        rules.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.lift.partial_cmp(&a.lift).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.consequent.cmp(&b.consequent))
        });

        rules
    }
}
