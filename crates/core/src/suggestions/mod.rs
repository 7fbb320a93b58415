//! Smart grocery suggestion engine
//!
//! Mines an append-only purchase log for association, replenishment, and
//! seasonal signals, and fuses them into a ranked suggestion list. Every
//! computation here is a pure function over a log snapshot passed in by the
//! caller; nothing reads ambient state and nothing is cached between calls.

mod associations;
mod engine;
mod expiration;
mod frequency;
mod insights;
mod seasonal;
mod types;

pub use associations::{AssociationIndex, ItemAssociation};
pub use engine::SuggestionEngine;
pub use expiration::{expiration_reminders, shelf_life_days, ExpirationReminder, ExpirationUrgency};
pub use frequency::{frequency_profiles, profile_for, FrequencyProfile};
pub use insights::{analyze_patterns, PatternInsights};
pub use seasonal::{seasonal_profiles, Season, SeasonalProfile};
pub use types::*;
