use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseRecordId(pub String);

/// One entry in the append-only purchase log. Immutable once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: PurchaseRecordId,
    pub user_id: String,
    pub item_name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub purchased_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Item name in canonical comparison form.
    pub fn normalized_name(&self) -> String {
        normalize_item_name(&self.item_name)
    }
}

/// Canonical form used for every item-name comparison: lowercased, with
/// separators and runs of whitespace collapsed to single spaces.
pub fn normalize_item_name(value: &str) -> String {
    value
        .to_ascii_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
