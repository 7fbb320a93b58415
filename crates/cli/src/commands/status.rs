use chrono::Utc;

use crate::commands::CommandResult;
use cartwise_core::config::{AppConfig, LoadOptions};
use cartwise_core::suggestions::SuggestionEngine;
use cartwise_db::repositories::{PurchaseLogRepository, SqlPurchaseLogRepository};
use cartwise_db::{connect_with_settings, migrations};

pub fn run(item: &str, user: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "status",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "status",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let user = user.unwrap_or("default").to_string();
    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let log = SqlPurchaseLogRepository::new(pool.clone())
            .list_for_user(&user)
            .await
            .map_err(|error| ("storage", error.to_string(), 5u8))?;
        pool.close().await;

        let engine = SuggestionEngine::with_config(config.suggestions.clone());
        Ok::<_, (&'static str, String, u8)>(engine.frequency_status(item, &log, Utc::now()))
    });

    match result {
        Ok(report) => {
            let message = match report.estimated_period_days {
                Some(period) => format!(
                    "{}: {} (estimated period {period:.1} days)",
                    report.item_name,
                    report.status.as_str()
                ),
                None => format!(
                    "{}: {} (fewer than two purchases on record)",
                    report.item_name,
                    report.status.as_str()
                ),
            };
            CommandResult::success("status", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("status", error_class, message, exit_code)
        }
    }
}
