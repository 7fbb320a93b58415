use tokio::sync::RwLock;

use cartwise_core::domain::purchase::{normalize_item_name, PurchaseRecord};
use cartwise_core::domain::shopping_list::{ListItem, ListItemId, ShoppingList};

use super::{PurchaseLogRepository, RepositoryError, ShoppingListRepository};

/// In-memory purchase log for tests and wiring without a database.
#[derive(Default)]
pub struct InMemoryPurchaseLogRepository {
    records: RwLock<Vec<PurchaseRecord>>,
}

#[async_trait::async_trait]
impl PurchaseLogRepository for InMemoryPurchaseLogRepository {
    async fn append(&self, mut record: PurchaseRecord) -> Result<(), RepositoryError> {
        record.item_name = normalize_item_name(&record.item_name);
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn append_many(&self, records: Vec<PurchaseRecord>) -> Result<(), RepositoryError> {
        let mut store = self.records.write().await;
        for mut record in records {
            record.item_name = normalize_item_name(&record.item_name);
            store.push(record);
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PurchaseRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut matching: Vec<PurchaseRecord> =
            records.iter().filter(|record| record.user_id == user_id).cloned().collect();
        matching.sort_by(|a, b| a.purchased_at.cmp(&b.purchased_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(matching)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|record| record.user_id == user_id).count() as u64)
    }
}

/// In-memory shopping list for tests and wiring without a database.
#[derive(Default)]
pub struct InMemoryShoppingListRepository {
    items: RwLock<Vec<ListItem>>,
}

#[async_trait::async_trait]
impl ShoppingListRepository for InMemoryShoppingListRepository {
    async fn list_for_user(&self, user_id: &str) -> Result<ShoppingList, RepositoryError> {
        let items = self.items.read().await;
        let mut matching: Vec<ListItem> =
            items.iter().filter(|item| item.user_id == user_id).cloned().collect();
        matching.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.name.cmp(&b.name)));
        Ok(ShoppingList::new(matching))
    }

    async fn add_item(&self, mut item: ListItem) -> Result<(), RepositoryError> {
        item.name = normalize_item_name(&item.name);
        let mut items = self.items.write().await;
        if let Some(existing) = items
            .iter_mut()
            .find(|candidate| candidate.user_id == item.user_id && candidate.name == item.name)
        {
            existing.quantity = item.quantity;
            existing.category = item.category;
            existing.unit = item.unit;
        } else {
            items.push(item);
        }
        Ok(())
    }

    async fn remove_item(&self, user_id: &str, id: &ListItemId) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| !(item.user_id == user_id && item.id == *id));
        Ok(items.len() < before)
    }

    async fn clear_for_user(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.user_id != user_id);
        Ok((before - items.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use cartwise_core::domain::purchase::{PurchaseRecord, PurchaseRecordId};
    use cartwise_core::domain::shopping_list::{ListItem, ListItemId};

    use crate::repositories::{
        InMemoryPurchaseLogRepository, InMemoryShoppingListRepository, PurchaseLogRepository,
        ShoppingListRepository,
    };

    #[tokio::test]
    async fn in_memory_purchase_log_round_trip() {
        let repo = InMemoryPurchaseLogRepository::default();
        let record = PurchaseRecord {
            id: PurchaseRecordId("p-1".to_string()),
            user_id: "default".to_string(),
            item_name: "Milk".to_string(),
            category: "dairy".to_string(),
            quantity: 1,
            unit_price: Decimal::new(189, 2),
            purchased_at: Utc::now(),
        };

        repo.append(record).await.expect("append");

        let records = repo.list_for_user("default").await.expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_name, "milk");
        assert_eq!(repo.count_for_user("default").await.expect("count"), 1);
    }

    #[tokio::test]
    async fn in_memory_shopping_list_merges_duplicates() {
        let repo = InMemoryShoppingListRepository::default();
        let item = ListItem {
            id: ListItemId("li-1".to_string()),
            user_id: "default".to_string(),
            name: "Pasta".to_string(),
            category: "grains".to_string(),
            quantity: 1,
            unit: "pieces".to_string(),
            added_at: Utc::now(),
        };

        repo.add_item(item.clone()).await.expect("add");
        let mut again = item;
        again.id = ListItemId("li-2".to_string());
        again.quantity = 4;
        repo.add_item(again).await.expect("re-add");

        let list = repo.list_for_user("default").await.expect("list");
        assert_eq!(list.len(), 1);
        assert_eq!(list.items[0].quantity, 4);
    }
}
