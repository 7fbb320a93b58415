use crate::connection::DbPool;
use crate::repositories::RepositoryError;
use sqlx::Executor;

/// Canonical demo-seed contract: what the fixture must leave behind.
const SEED_USER: &str = "default";
const SEED_PURCHASE_COUNT: i64 = 21;
const SEED_LIST_COUNT: i64 = 2;
const SEED_DISTINCT_ITEMS: i64 = 6;

/// Item cadences the suggestion engine's demo output depends on.
const SEED_ITEM_COUNTS: &[(&str, i64)] =
    &[("milk", 4), ("bread", 4), ("pasta", 4), ("pasta sauce", 3), ("eggs", 2), ("oranges", 4)];

/// Deterministic demo dataset: a few months of purchase history plus a
/// current shopping list, tuned so association, replenishment, and
/// seasonal signals all fire.
pub struct DemoSeedDataset;

#[derive(Debug, Clone)]
pub struct SeedResult {
    pub purchase_records: usize,
    pub list_items: usize,
}

#[derive(Debug, Clone)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl DemoSeedDataset {
    /// SQL fixture content for the demo dataset.
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_history.sql");

    /// Load the demo dataset. Idempotent: re-running leaves the database
    /// unchanged.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            purchase_records: SEED_PURCHASE_COUNT as usize,
            list_items: SEED_LIST_COUNT as usize,
        })
    }

    /// Verify the seeded rows match the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let purchase_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM purchase_record WHERE user_id = ?1")
                .bind(SEED_USER)
                .fetch_one(pool)
                .await?;
        checks.push(("purchase-records", purchase_count == SEED_PURCHASE_COUNT));

        let list_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM shopping_list_item WHERE user_id = ?1")
                .bind(SEED_USER)
                .fetch_one(pool)
                .await?;
        checks.push(("shopping-list-items", list_count == SEED_LIST_COUNT));

        let distinct_items: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT item_name) FROM purchase_record WHERE user_id = ?1",
        )
        .bind(SEED_USER)
        .fetch_one(pool)
        .await?;
        checks.push(("distinct-items", distinct_items == SEED_DISTINCT_ITEMS));

        for (item, expected) in SEED_ITEM_COUNTS {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM purchase_record WHERE user_id = ?1 AND item_name = ?2",
            )
            .bind(SEED_USER)
            .bind(item)
            .fetch_one(pool)
            .await?;
            checks.push((*item, count == *expected));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use super::DemoSeedDataset;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn load_then_verify_passes() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        DemoSeedDataset::load(&pool).await.expect("load");
        let verification = DemoSeedDataset::verify(&pool).await.expect("verify");

        assert!(
            verification.all_present,
            "failed checks: {:?}",
            verification
                .checks
                .iter()
                .filter(|(_, passed)| !passed)
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        DemoSeedDataset::load(&pool).await.expect("first load");
        DemoSeedDataset::load(&pool).await.expect("second load");

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify");
        assert!(verification.all_present);
    }
}
