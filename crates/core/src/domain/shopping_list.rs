use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::purchase::normalize_item_name;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListItemId(pub String);

/// An entry on the user's current shopping list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: ListItemId,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit: String,
    pub added_at: DateTime<Utc>,
}

/// The current shopping list for one user. Lookup is by normalized name so
/// "Pasta Sauce" and "pasta-sauce" count as the same item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub items: Vec<ListItem>,
}

impl ShoppingList {
    pub fn new(items: Vec<ListItem>) -> Self {
        Self { items }
    }

    pub fn contains(&self, item_name: &str) -> bool {
        self.find_item(item_name).is_some()
    }

    pub fn find_item(&self, item_name: &str) -> Option<&ListItem> {
        let needle = normalize_item_name(item_name);
        self.items.iter().find(|item| normalize_item_name(&item.name) == needle)
    }

    /// Normalized names of everything currently on the list.
    pub fn item_names(&self) -> Vec<String> {
        self.items.iter().map(|item| normalize_item_name(&item.name)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
