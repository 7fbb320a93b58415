use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use cartwise_core::domain::purchase::{normalize_item_name, PurchaseRecord, PurchaseRecordId};

use super::{PurchaseLogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPurchaseLogRepository {
    pool: DbPool,
}

impl SqlPurchaseLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<PurchaseRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let item_name: String =
        row.try_get("item_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let unit_price_str: String =
        row.try_get("unit_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let purchased_at_str: String =
        row.try_get("purchased_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    // A record with an unreadable timestamp cannot participate in gap or
    // basket math; the caller skips it rather than aborting the read.
    let purchased_at = DateTime::parse_from_rfc3339(&purchased_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            RepositoryError::Decode(format!("unparseable purchased_at `{purchased_at_str}`"))
        })?;

    let unit_price = Decimal::from_str(&unit_price_str).unwrap_or(Decimal::ZERO);

    Ok(PurchaseRecord {
        id: PurchaseRecordId(id),
        user_id,
        item_name,
        category,
        quantity: quantity.max(0) as u32,
        unit_price,
        purchased_at,
    })
}

async fn insert_record(
    executor: impl sqlx::SqliteExecutor<'_>,
    record: &PurchaseRecord,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO purchase_record
            (id, user_id, item_name, category, quantity, unit_price, purchased_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO NOTHING",
    )
    .bind(&record.id.0)
    .bind(&record.user_id)
    .bind(normalize_item_name(&record.item_name))
    .bind(&record.category)
    .bind(record.quantity as i64)
    .bind(record.unit_price.to_string())
    .bind(record.purchased_at.to_rfc3339())
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait::async_trait]
impl PurchaseLogRepository for SqlPurchaseLogRepository {
    async fn append(&self, record: PurchaseRecord) -> Result<(), RepositoryError> {
        insert_record(&self.pool, &record).await
    }

    async fn append_many(&self, records: Vec<PurchaseRecord>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for record in &records {
            insert_record(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PurchaseRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, item_name, category, quantity, unit_price, purchased_at
             FROM purchase_record
             WHERE user_id = ?
             ORDER BY purchased_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match row_to_record(row) {
                Ok(record) => records.push(record),
                Err(RepositoryError::Decode(message)) => {
                    tracing::warn!(
                        event_name = "storage.purchase_log.record_skipped",
                        user_id = %user_id,
                        error = %message,
                        "skipping malformed purchase record"
                    );
                }
                Err(error) => return Err(error),
            }
        }
        Ok(records)
    }

    async fn count_for_user(&self, user_id: &str) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM purchase_record WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }
}
