use std::env;
use std::sync::{Mutex, OnceLock};

use cartwise_cli::commands::{migrate, seed, status, suggest};
use serde_json::Value;

// In-memory SQLite gives every pooled connection its own database, so the
// runtime tests pin the pool to a single connection.
const MEMORY_DB_ENV: &[(&str, &str)] =
    &[("CARTWISE_DATABASE_URL", "sqlite::memory:"), ("CARTWISE_DATABASE_MAX_CONNECTIONS", "1")];

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(MEMORY_DB_ENV, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("CARTWISE_DATABASE_URL", "postgres://localhost/cartwise")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn unparseable_env_override_fails_config_validation() {
    with_env(
        &[
            ("CARTWISE_DATABASE_URL", "sqlite::memory:"),
            ("CARTWISE_SUGGESTIONS_MAX_SUGGESTIONS", "plenty"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 2);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn seed_returns_deterministic_summary() {
    with_env(MEMORY_DB_ENV, || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert_eq!(message, "demo dataset loaded: 21 purchase records, 2 shopping-list items");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(MEMORY_DB_ENV, || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["status"], "ok");

        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn suggest_on_fresh_database_reports_cold_start() {
    with_env(MEMORY_DB_ENV, || {
        let result = suggest::run(None, None);
        assert_eq!(result.exit_code, 0, "cold start is not an error");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "suggest");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "no suggestions yet: purchase history is too thin to mine");
    });
}

#[test]
fn status_on_fresh_database_is_unknown() {
    with_env(MEMORY_DB_ENV, || {
        let result = status::run("milk", None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "status");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "milk: unknown (fewer than two purchases on record)");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CARTWISE_DATABASE_URL",
        "CARTWISE_DATABASE_MAX_CONNECTIONS",
        "CARTWISE_DATABASE_TIMEOUT_SECS",
        "CARTWISE_SERVER_BIND_ADDRESS",
        "CARTWISE_SERVER_API_PORT",
        "CARTWISE_SERVER_HEALTH_CHECK_PORT",
        "CARTWISE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "CARTWISE_SUGGESTIONS_MIN_HISTORY_RECORDS",
        "CARTWISE_SUGGESTIONS_MIN_PAIR_BASKETS",
        "CARTWISE_SUGGESTIONS_TOP_K_ASSOCIATIONS",
        "CARTWISE_SUGGESTIONS_MAX_SUGGESTIONS",
        "CARTWISE_SUGGESTIONS_OVERDUE_FACTOR",
        "CARTWISE_SUGGESTIONS_SEASONAL_MIN_PURCHASES",
        "CARTWISE_SUGGESTIONS_SEASONAL_SHARE_THRESHOLD",
        "CARTWISE_LOGGING_LEVEL",
        "CARTWISE_LOGGING_FORMAT",
        "CARTWISE_LOG_LEVEL",
        "CARTWISE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
