use chrono::{DateTime, Utc};
use sqlx::Row;

use cartwise_core::domain::purchase::normalize_item_name;
use cartwise_core::domain::shopping_list::{ListItem, ListItemId, ShoppingList};

use super::{RepositoryError, ShoppingListRepository};
use crate::DbPool;

pub struct SqlShoppingListRepository {
    pool: DbPool,
}

impl SqlShoppingListRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<ListItem, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let unit: String = row.try_get("unit").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let added_at_str: String =
        row.try_get("added_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let added_at = DateTime::parse_from_rfc3339(&added_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RepositoryError::Decode(format!("unparseable added_at `{added_at_str}`")))?;

    Ok(ListItem {
        id: ListItemId(id),
        user_id,
        name,
        category,
        quantity: quantity.max(0) as u32,
        unit,
        added_at,
    })
}

#[async_trait::async_trait]
impl ShoppingListRepository for SqlShoppingListRepository {
    async fn list_for_user(&self, user_id: &str) -> Result<ShoppingList, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, category, quantity, unit, added_at
             FROM shopping_list_item
             WHERE user_id = ?
             ORDER BY added_at ASC, name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(row_to_item).collect::<Result<Vec<_>, _>>()?;
        Ok(ShoppingList::new(items))
    }

    async fn add_item(&self, item: ListItem) -> Result<(), RepositoryError> {
        // Re-adding an item merges onto the existing row instead of
        // producing a duplicate list entry.
        sqlx::query(
            "INSERT INTO shopping_list_item
                (id, user_id, name, category, quantity, unit, added_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id, name) DO UPDATE SET
                quantity = excluded.quantity,
                category = excluded.category,
                unit = excluded.unit",
        )
        .bind(&item.id.0)
        .bind(&item.user_id)
        .bind(normalize_item_name(&item.name))
        .bind(&item.category)
        .bind(item.quantity as i64)
        .bind(&item.unit)
        .bind(item.added_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_item(&self, user_id: &str, id: &ListItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shopping_list_item WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_for_user(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shopping_list_item WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use cartwise_core::domain::shopping_list::{ListItem, ListItemId};

    use super::SqlShoppingListRepository;
    use crate::repositories::ShoppingListRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn item(id: &str, name: &str) -> ListItem {
        ListItem {
            id: ListItemId(id.to_string()),
            user_id: "default".to_string(),
            name: name.to_string(),
            category: "grains".to_string(),
            quantity: 1,
            unit: "pieces".to_string(),
            added_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn add_and_list_round_trip() {
        let pool = setup().await;
        let repo = SqlShoppingListRepository::new(pool);

        repo.add_item(item("li-1", "Pasta")).await.expect("add");
        repo.add_item(item("li-2", "sauce")).await.expect("add");

        let list = repo.list_for_user("default").await.expect("list");
        assert_eq!(list.len(), 2);
        assert!(list.contains("pasta"));
    }

    #[tokio::test]
    async fn readding_an_item_merges_instead_of_duplicating() {
        let pool = setup().await;
        let repo = SqlShoppingListRepository::new(pool);

        repo.add_item(item("li-1", "Pasta")).await.expect("add");
        let mut again = item("li-2", "pasta");
        again.quantity = 3;
        repo.add_item(again).await.expect("re-add");

        let list = repo.list_for_user("default").await.expect("list");
        assert_eq!(list.len(), 1);
        assert_eq!(list.items[0].quantity, 3);
        assert_eq!(list.items[0].id.0, "li-1", "original row survives a merge");
    }

    #[tokio::test]
    async fn remove_reports_whether_anything_was_deleted() {
        let pool = setup().await;
        let repo = SqlShoppingListRepository::new(pool);

        repo.add_item(item("li-1", "pasta")).await.expect("add");

        assert!(repo.remove_item("default", &ListItemId("li-1".to_string())).await.expect("remove"));
        assert!(!repo.remove_item("default", &ListItemId("li-1".to_string())).await.expect("gone"));
    }

    #[tokio::test]
    async fn clear_empties_only_that_user() {
        let pool = setup().await;
        let repo = SqlShoppingListRepository::new(pool);

        repo.add_item(item("li-1", "pasta")).await.expect("add");
        let mut guest = item("li-2", "milk");
        guest.user_id = "guest".to_string();
        repo.add_item(guest).await.expect("add guest");

        assert_eq!(repo.clear_for_user("default").await.expect("clear"), 1);
        assert!(repo.list_for_user("default").await.expect("list").is_empty());
        assert_eq!(repo.list_for_user("guest").await.expect("guest list").len(), 1);
    }
}
