use async_trait::async_trait;
use thiserror::Error;

use cartwise_core::domain::purchase::PurchaseRecord;
use cartwise_core::domain::shopping_list::{ListItem, ListItemId, ShoppingList};

pub mod memory;
pub mod purchase_log;
pub mod shopping_list;

pub use memory::{InMemoryPurchaseLogRepository, InMemoryShoppingListRepository};
pub use purchase_log::SqlPurchaseLogRepository;
pub use shopping_list::SqlShoppingListRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Access to the append-only purchase log. Appends for one user go through
/// a single writer path so per-item gap sequences stay monotonic; readers
/// may observe a log mid-append, which is acceptable because everything
/// derived from it is advisory.
#[async_trait]
pub trait PurchaseLogRepository: Send + Sync {
    async fn append(&self, record: PurchaseRecord) -> Result<(), RepositoryError>;

    /// Append a batch atomically (one shopping trip marked purchased).
    async fn append_many(&self, records: Vec<PurchaseRecord>) -> Result<(), RepositoryError>;

    /// Full log for a user, oldest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PurchaseRecord>, RepositoryError>;

    async fn count_for_user(&self, user_id: &str) -> Result<u64, RepositoryError>;
}

/// Access to the current shopping list.
#[async_trait]
pub trait ShoppingListRepository: Send + Sync {
    async fn list_for_user(&self, user_id: &str) -> Result<ShoppingList, RepositoryError>;

    async fn add_item(&self, item: ListItem) -> Result<(), RepositoryError>;

    /// Returns whether anything was removed.
    async fn remove_item(&self, user_id: &str, id: &ListItemId) -> Result<bool, RepositoryError>;

    /// Returns the number of items cleared.
    async fn clear_for_user(&self, user_id: &str) -> Result<u64, RepositoryError>;
}
