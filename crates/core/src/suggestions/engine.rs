//! Suggestion aggregator: fuses association, replenishment, and seasonal
//! signals into one ranked, deduplicated list.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::config::SuggestionsConfig;
use crate::domain::purchase::{normalize_item_name, PurchaseRecord};

use super::associations::AssociationIndex;
use super::types::{
    AssociationRule, FrequencyReport, FrequencyStatus, Priority, Suggestion, SuggestionRequest,
    SuggestionSignal,
};
use super::{frequency, seasonal};

/// Confidence attached to replenishment reminders. The gap history behind a
/// due item is strong evidence, but never a certainty.
const REPLENISHMENT_CONFIDENCE: f64 = 0.8;

/// The main suggestion engine. Holds tunables only; every query takes the
/// purchase-log snapshot as an explicit argument.
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    config: SuggestionsConfig,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self { config: SuggestionsConfig::default() }
    }

    pub fn with_config(config: SuggestionsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuggestionsConfig {
        &self.config
    }

    /// Ranked suggestions for the current list against the full log.
    ///
    /// A short log is the expected cold-start state and yields an empty
    /// list, never an error. Output is a pure function of (config, request,
    /// log): calling twice with the same inputs returns the same order.
    pub fn suggest(&self, request: &SuggestionRequest, log: &[PurchaseRecord]) -> Vec<Suggestion> {
        if log.len() < self.config.min_history_records {
            return Vec::new();
        }

        let on_list: HashSet<String> =
            request.current_items.iter().map(|item| normalize_item_name(item)).collect();

        let mut candidates: Vec<(Suggestion, f64)> = Vec::new();

        // Signal 1: consequents of items already on the list.
        let index = AssociationIndex::build(log);
        let mut seen_seeds = HashSet::new();
        for seed in &request.current_items {
            let seed = normalize_item_name(seed);
            if !seen_seeds.insert(seed.clone()) {
                continue;
            }

            for rule in index
                .rules_for(&seed, self.config.min_pair_baskets)
                .into_iter()
                .filter(|rule| !on_list.contains(&rule.consequent))
                .take(self.config.top_k_associations)
            {
                let percent = (rule.confidence * 100.0).round() as i64;
                let category =
                    index.category_of(&rule.consequent).unwrap_or_default().to_string();
                let suggestion = Suggestion {
                    item_name: rule.consequent.clone(),
                    category,
                    reason: format!("bought with {seed} {percent}% of the time"),
                    confidence: rule.confidence,
                    priority: Priority::Medium,
                    signal: SuggestionSignal::Association,
                };
                candidates.push((suggestion, rule.confidence));
            }
        }

        // Signal 2: items whose repurchase interval says they are due.
        let mut profiles: Vec<_> = frequency::frequency_profiles(log).into_values().collect();
        profiles.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        for profile in profiles {
            if on_list.contains(&profile.item_name) {
                continue;
            }

            let priority = match profile.status(request.now, &self.config) {
                FrequencyStatus::Overdue => Priority::High,
                FrequencyStatus::Due => Priority::Medium,
                FrequencyStatus::Ok | FrequencyStatus::Unknown => continue,
            };

            let period = profile.estimated_period_days.expect("due/overdue implies estimate");
            let suggestion = Suggestion {
                item_name: profile.item_name.clone(),
                category: profile.category.clone(),
                reason: format!("you typically rebuy every {period:.0} days"),
                confidence: REPLENISHMENT_CONFIDENCE,
                priority,
                signal: SuggestionSignal::Replenishment,
            };
            candidates.push((suggestion, REPLENISHMENT_CONFIDENCE));
        }

        // Signal 3: items whose history concentrates in the current season.
        let season = seasonal::Season::of(request.now);
        let mut seasonal: Vec<_> = seasonal::seasonal_profiles(log).into_values().collect();
        seasonal.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        for profile in seasonal {
            if on_list.contains(&profile.item_name) || !profile.in_season(season, &self.config) {
                continue;
            }

            let share = profile.share(season);
            let suggestion = Suggestion {
                item_name: profile.item_name.clone(),
                category: profile.category.clone(),
                reason: "in season".to_string(),
                confidence: share,
                priority: Priority::Low,
                signal: SuggestionSignal::Seasonal,
            };
            candidates.push((suggestion, share));
        }

        // Merge by item: corroborating signals add confidence (capped at
        // 1.0); the highest-priority reason wins the label.
        let mut merged: HashMap<String, (Suggestion, f64)> = HashMap::new();
        for (suggestion, contribution) in candidates {
            match merged.entry(suggestion.item_name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert((suggestion, contribution));
                }
                Entry::Occupied(mut slot) => {
                    let (existing, top_contribution) = slot.get_mut();
                    existing.confidence = (existing.confidence + contribution).min(1.0);
                    let replaces = suggestion.priority.rank() > existing.priority.rank()
                        || (suggestion.priority.rank() == existing.priority.rank()
                            && contribution > *top_contribution);
                    if replaces {
                        existing.reason = suggestion.reason;
                        existing.priority = suggestion.priority;
                        existing.signal = suggestion.signal;
                        *top_contribution = contribution;
                    }
                }
            }
        }

        let mut results: Vec<Suggestion> =
            merged.into_values().map(|(suggestion, _)| suggestion).collect();
        results.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then_with(|| {
                    b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.item_name.cmp(&b.item_name))
        });
        results.truncate(request.limit);
        results
    }

    /// Ranked association rules for one item over the full log.
    pub fn association_patterns(
        &self,
        item: &str,
        log: &[PurchaseRecord],
    ) -> Vec<AssociationRule> {
        AssociationIndex::build(log).rules_for(item, self.config.min_pair_baskets)
    }

    /// Replenishment status for one item at `now`.
    pub fn frequency_status(
        &self,
        item: &str,
        log: &[PurchaseRecord],
        now: DateTime<Utc>,
    ) -> FrequencyReport {
        match frequency::profile_for(item, log) {
            Some(profile) => FrequencyReport {
                item_name: profile.item_name.clone(),
                estimated_period_days: profile.estimated_period_days,
                status: profile.status(now, &self.config),
            },
            None => FrequencyReport {
                item_name: normalize_item_name(item),
                estimated_period_days: None,
                status: FrequencyStatus::Unknown,
            },
        }
    }
}
