//! Expiration reminders for recently purchased perishables.
//!
//! The log does not record per-item shelf life, so estimates come from a
//! category policy (dairy keeps a week, fish two days, canned goods a
//! year). Reminders only look at the last 30 days of purchases; older
//! perishables are assumed long gone.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::purchase::PurchaseRecord;

/// How far back to scan for items that might still be in the kitchen.
const LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationUrgency {
    /// Already past the estimated shelf life
    Expired,
    /// Expires today or tomorrow
    Urgent,
    /// Expires within three days
    Warning,
    /// Expires within a week
    Notice,
}

impl ExpirationUrgency {
    fn classify(days_until_expiry: i64) -> Option<Self> {
        match days_until_expiry {
            days if days < 0 => Some(Self::Expired),
            0 | 1 => Some(Self::Urgent),
            2 | 3 => Some(Self::Warning),
            4..=7 => Some(Self::Notice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirationReminder {
    pub item_name: String,
    pub category: String,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub urgency: ExpirationUrgency,
    pub message: String,
}

/// Estimated shelf life in days for a category; unknown categories get the
/// short-perishable default.
pub fn shelf_life_days(category: &str) -> i64 {
    match category.trim().to_ascii_lowercase().as_str() {
        "dairy" => 7,
        "meat" => 3,
        "fish" => 2,
        "fruits" => 5,
        "vegetables" => 7,
        "bread" | "grains" => 5,
        "eggs" => 14,
        "leftovers" => 3,
        "canned" => 365,
        "frozen" => 90,
        "dry goods" | "dry_goods" => 180,
        _ => 7,
    }
}

fn message_for(item: &str, urgency: ExpirationUrgency, days_until_expiry: i64) -> String {
    match urgency {
        ExpirationUrgency::Expired => {
            format!("{item} expired {} days ago - discard", -days_until_expiry)
        }
        ExpirationUrgency::Urgent if days_until_expiry == 0 => {
            format!("{item} expires today - use immediately")
        }
        ExpirationUrgency::Urgent => format!("{item} expires tomorrow - use soon"),
        ExpirationUrgency::Warning => {
            format!("{item} expires in {days_until_expiry} days - plan to use")
        }
        ExpirationUrgency::Notice => format!("{item} expires in {days_until_expiry} days"),
    }
}

/// Reminders for everything bought in the last 30 days that is expired or
/// expiring within a week, most urgent first. Only the latest purchase of
/// each item counts; a rebuy resets the clock.
pub fn expiration_reminders(
    log: &[PurchaseRecord],
    now: DateTime<Utc>,
) -> Vec<ExpirationReminder> {
    let cutoff = now - Duration::days(LOOKBACK_DAYS);

    let mut latest: std::collections::HashMap<String, &PurchaseRecord> =
        std::collections::HashMap::new();
    for record in log {
        if record.purchased_at < cutoff || record.purchased_at > now {
            continue;
        }
        latest
            .entry(record.normalized_name())
            .and_modify(|current| {
                if record.purchased_at > current.purchased_at {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut reminders: Vec<ExpirationReminder> = latest
        .into_iter()
        .filter_map(|(item_name, record)| {
            let expires_at =
                record.purchased_at + Duration::days(shelf_life_days(&record.category));
            let days_until_expiry = (expires_at - now).num_days();
            let urgency = ExpirationUrgency::classify(days_until_expiry)?;

            Some(ExpirationReminder {
                message: message_for(&item_name, urgency, days_until_expiry),
                item_name,
                category: record.category.clone(),
                purchased_at: record.purchased_at,
                expires_at,
                days_until_expiry,
                urgency,
            })
        })
        .collect();

    reminders.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then_with(|| a.days_until_expiry.cmp(&b.days_until_expiry))
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    reminders
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal::Decimal;

    use crate::domain::purchase::{PurchaseRecord, PurchaseRecordId};

    use super::{expiration_reminders, shelf_life_days, ExpirationUrgency};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-04-10T12:00:00Z").expect("base date").to_utc()
    }

    fn record(item: &str, category: &str, days_ago: i64) -> PurchaseRecord {
        PurchaseRecord {
            id: PurchaseRecordId(format!("p-{item}-{days_ago}")),
            user_id: "default".to_string(),
            item_name: item.to_string(),
            category: category.to_string(),
            quantity: 1,
            unit_price: Decimal::new(199, 2),
            purchased_at: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn category_policy_covers_known_and_unknown() {
        assert_eq!(shelf_life_days("dairy"), 7);
        assert_eq!(shelf_life_days("Fish"), 2);
        assert_eq!(shelf_life_days("canned"), 365);
        assert_eq!(shelf_life_days("mystery"), 7);
    }

    #[test]
    fn reminders_classify_and_order_by_urgency() {
        let log = vec![
            record("milk", "dairy", 9),       // expired 2 days ago
            record("salmon", "fish", 2),      // expires today
            record("yogurt", "dairy", 4),     // expires in 3 days
            record("eggs", "eggs", 8),        // expires in 6 days
            record("beans", "canned", 5),     // expires next year: no reminder
        ];

        let reminders = expiration_reminders(&log, now());
        let names: Vec<&str> =
            reminders.iter().map(|reminder| reminder.item_name.as_str()).collect();

        assert_eq!(names, vec!["milk", "salmon", "yogurt", "eggs"]);
        assert_eq!(reminders[0].urgency, ExpirationUrgency::Expired);
        assert_eq!(reminders[0].message, "milk expired 2 days ago - discard");
        assert_eq!(reminders[1].urgency, ExpirationUrgency::Urgent);
        assert_eq!(reminders[1].message, "salmon expires today - use immediately");
    }

    #[test]
    fn rebuy_resets_the_clock() {
        // Milk bought 9 days ago would be expired, but it was rebought
        // 2 days ago.
        let log = vec![record("milk", "dairy", 9), record("milk", "dairy", 2)];

        let reminders = expiration_reminders(&log, now());
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].days_until_expiry, 5);
        assert_eq!(reminders[0].urgency, ExpirationUrgency::Notice);
    }

    #[test]
    fn purchases_outside_the_lookback_are_ignored() {
        let log = vec![record("milk", "dairy", 45)];
        assert!(expiration_reminders(&log, now()).is_empty());
    }
}
