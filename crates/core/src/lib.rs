pub mod config;
pub mod domain;
pub mod errors;
pub mod suggestions;

pub use domain::purchase::{normalize_item_name, PurchaseRecord, PurchaseRecordId};
pub use domain::shopping_list::{ListItem, ListItemId, ShoppingList};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use suggestions::{
    AssociationRule, FrequencyReport, FrequencyStatus, PatternInsights, Priority, Suggestion,
    SuggestionEngine, SuggestionRequest, SuggestionSignal,
};
