use chrono::Utc;

use crate::commands::CommandResult;
use cartwise_core::config::{AppConfig, LoadOptions};
use cartwise_core::suggestions::{SuggestionEngine, SuggestionRequest};
use cartwise_db::repositories::{
    PurchaseLogRepository, ShoppingListRepository, SqlPurchaseLogRepository,
    SqlShoppingListRepository,
};
use cartwise_db::{connect_with_settings, migrations};

pub fn run(limit: Option<usize>, user: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "suggest",
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
                "suggest",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let user = user.unwrap_or("default").to_string();
    let limit = limit.unwrap_or(config.suggestions.max_suggestions);

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

        let list = SqlShoppingListRepository::new(pool.clone())
            .list_for_user(&user)
            .await
            .map_err(|error| ("storage", error.to_string(), 5u8))?;
        let log = SqlPurchaseLogRepository::new(pool.clone())
            .list_for_user(&user)
            .await
            .map_err(|error| ("storage", error.to_string(), 5u8))?;
        pool.close().await;

        let engine = SuggestionEngine::with_config(config.suggestions.clone());
        let request = SuggestionRequest::new(Utc::now())
            .with_current_items(list.item_names())
            .with_limit(limit);

        Ok::<_, (&'static str, String, u8)>(engine.suggest(&request, &log))
    });

    match result {
        Ok(suggestions) if suggestions.is_empty() => CommandResult::success(
            "suggest",
            "no suggestions yet: purchase history is too thin to mine",
        ),
        Ok(suggestions) => {
            let lines: Vec<String> = suggestions
                .iter()
                .enumerate()
                .map(|(index, suggestion)| {
                    format!(
                        "  {}. {} [{:?}] {} (confidence {:.2})",
                        index + 1,
                        suggestion.item_name,
                        suggestion.priority,
                        suggestion.reason,
                        suggestion.confidence
                    )
                })
                .collect();
            CommandResult::success(
                "suggest",
                format!("{} suggestions:\n{}", suggestions.len(), lines.join("\n")),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("suggest", error_class, message, exit_code)
        }
    }
}
