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
                "patterns",
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
                "patterns",
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
        Ok::<_, (&'static str, String, u8)>(engine.association_patterns(item, &log))
    });

    match result {
        Ok(rules) if rules.is_empty() => CommandResult::success(
            "patterns",
            format!("no association rules for `{item}`: not enough shared baskets"),
        ),
        Ok(rules) => {
            let lines: Vec<String> = rules
                .iter()
                .map(|rule| {
                    format!(
                        "  {} confidence={:.2} lift={:.2} support={:.2}",
                        rule.consequent, rule.confidence, rule.lift, rule.support
                    )
                })
                .collect();
            CommandResult::success(
                "patterns",
                format!("{} rules for `{item}`:\n{}", rules.len(), lines.join("\n")),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("patterns", error_class, message, exit_code)
        }
    }
}
