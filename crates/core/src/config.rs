use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub suggestions: SuggestionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub api_port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Tunables for the suggestion engine. Every threshold here is a contract
/// value: changing one changes which suggestions are emitted, not how.
#[derive(Clone, Debug)]
pub struct SuggestionsConfig {
    /// Below this many purchase records the engine treats the log as cold
    /// start and returns no suggestions.
    pub min_history_records: usize,
    /// Item pairs co-occurring in fewer baskets than this are discarded.
    pub min_pair_baskets: u64,
    /// Association consequents fetched per current-list item.
    pub top_k_associations: usize,
    /// Default cap on the aggregated suggestion list.
    pub max_suggestions: usize,
    /// Multiplier on the estimated period after which a due item becomes
    /// overdue.
    pub overdue_factor: f64,
    /// Minimum purchases of an item before any seasonal claim is made.
    pub seasonal_min_purchases: u64,
    /// Minimum fraction of purchases in the current season to flag an item
    /// in-season (1.5x the uniform 0.25 baseline).
    pub seasonal_share_threshold: f64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub max_suggestions: Option<usize>,
    pub min_history_records: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://cartwise.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                api_port: 8300,
                health_check_port: 8301,
                graceful_shutdown_secs: 15,
            },
            suggestions: SuggestionsConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            min_history_records: 3,
            min_pair_baskets: 3,
            top_k_associations: 5,
            max_suggestions: 15,
            overdue_factor: 1.5,
            seasonal_min_purchases: 4,
            seasonal_share_threshold: 0.375,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cartwise.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(api_port) = server.api_port {
                self.server.api_port = api_port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(suggestions) = patch.suggestions {
            if let Some(min_history_records) = suggestions.min_history_records {
                self.suggestions.min_history_records = min_history_records;
            }
            if let Some(min_pair_baskets) = suggestions.min_pair_baskets {
                self.suggestions.min_pair_baskets = min_pair_baskets;
            }
            if let Some(top_k_associations) = suggestions.top_k_associations {
                self.suggestions.top_k_associations = top_k_associations;
            }
            if let Some(max_suggestions) = suggestions.max_suggestions {
                self.suggestions.max_suggestions = max_suggestions;
            }
            if let Some(overdue_factor) = suggestions.overdue_factor {
                self.suggestions.overdue_factor = overdue_factor;
            }
            if let Some(seasonal_min_purchases) = suggestions.seasonal_min_purchases {
                self.suggestions.seasonal_min_purchases = seasonal_min_purchases;
            }
            if let Some(seasonal_share_threshold) = suggestions.seasonal_share_threshold {
                self.suggestions.seasonal_share_threshold = seasonal_share_threshold;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CARTWISE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CARTWISE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("CARTWISE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("CARTWISE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CARTWISE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CARTWISE_SERVER_API_PORT") {
            self.server.api_port = parse_u16("CARTWISE_SERVER_API_PORT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("CARTWISE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("CARTWISE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("CARTWISE_SUGGESTIONS_MIN_HISTORY_RECORDS") {
            self.suggestions.min_history_records =
                parse_usize("CARTWISE_SUGGESTIONS_MIN_HISTORY_RECORDS", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SUGGESTIONS_MIN_PAIR_BASKETS") {
            self.suggestions.min_pair_baskets =
                parse_u64("CARTWISE_SUGGESTIONS_MIN_PAIR_BASKETS", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SUGGESTIONS_TOP_K_ASSOCIATIONS") {
            self.suggestions.top_k_associations =
                parse_usize("CARTWISE_SUGGESTIONS_TOP_K_ASSOCIATIONS", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SUGGESTIONS_MAX_SUGGESTIONS") {
            self.suggestions.max_suggestions =
                parse_usize("CARTWISE_SUGGESTIONS_MAX_SUGGESTIONS", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SUGGESTIONS_OVERDUE_FACTOR") {
            self.suggestions.overdue_factor =
                parse_f64("CARTWISE_SUGGESTIONS_OVERDUE_FACTOR", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SUGGESTIONS_SEASONAL_MIN_PURCHASES") {
            self.suggestions.seasonal_min_purchases =
                parse_u64("CARTWISE_SUGGESTIONS_SEASONAL_MIN_PURCHASES", &value)?;
        }
        if let Some(value) = read_env("CARTWISE_SUGGESTIONS_SEASONAL_SHARE_THRESHOLD") {
            self.suggestions.seasonal_share_threshold =
                parse_f64("CARTWISE_SUGGESTIONS_SEASONAL_SHARE_THRESHOLD", &value)?;
        }

        let log_level =
            read_env("CARTWISE_LOGGING_LEVEL").or_else(|| read_env("CARTWISE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CARTWISE_LOGGING_FORMAT").or_else(|| read_env("CARTWISE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(max_suggestions) = overrides.max_suggestions {
            self.suggestions.max_suggestions = max_suggestions;
        }
        if let Some(min_history_records) = overrides.min_history_records {
            self.suggestions.min_history_records = min_history_records;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_suggestions(&self.suggestions)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cartwise.toml"), PathBuf::from("config/cartwise.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.api_port == 0 {
        return Err(ConfigError::Validation(
            "server.api_port must be greater than zero".to_string(),
        ));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.api_port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.api_port and server.health_check_port must differ".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_suggestions(suggestions: &SuggestionsConfig) -> Result<(), ConfigError> {
    if suggestions.top_k_associations == 0 {
        return Err(ConfigError::Validation(
            "suggestions.top_k_associations must be greater than zero".to_string(),
        ));
    }

    if suggestions.max_suggestions == 0 {
        return Err(ConfigError::Validation(
            "suggestions.max_suggestions must be greater than zero".to_string(),
        ));
    }

    if suggestions.overdue_factor < 1.0 {
        return Err(ConfigError::Validation(
            "suggestions.overdue_factor must be at least 1.0".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&suggestions.seasonal_share_threshold) {
        return Err(ConfigError::Validation(
            "suggestions.seasonal_share_threshold must be in range 0.0..=1.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    suggestions: Option<SuggestionsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    api_port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestionsPatch {
    min_history_records: Option<usize>,
    min_pair_baskets: Option<u64>,
    top_k_associations: Option<usize>,
    max_suggestions: Option<usize>,
    overdue_factor: Option<f64>,
    seasonal_min_purchases: Option<u64>,
    seasonal_share_threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.suggestions.max_suggestions, 15);
        assert_eq!(config.suggestions.top_k_associations, 5);
        assert!((config.suggestions.overdue_factor - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[database]\nurl = \"sqlite::memory:\"\n\n\
             [suggestions]\ntop_k_associations = 3\nmax_suggestions = 8\n\n\
             [logging]\nlevel = \"debug\"\nformat = \"json\""
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load should succeed");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.suggestions.top_k_associations, 3);
        assert_eq!(config.suggestions.max_suggestions, 8);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("/nonexistent/cartwise.toml".into()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn programmatic_overrides_win_over_defaults() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                max_suggestions: Some(4),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load should succeed");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.suggestions.max_suggestions, 4);
    }

    #[test]
    fn non_sqlite_url_fails_validation() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/cartwise".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn overdue_factor_below_one_fails_validation() {
        let mut config = AppConfig::default();
        config.suggestions.overdue_factor = 0.5;

        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn interpolation_reports_missing_variable() {
        let result = super::interpolate_env_vars("url = \"${CARTWISE_TEST_UNSET_VAR}\"");
        assert!(matches!(result, Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "CARTWISE_TEST_UNSET_VAR"));
    }

    #[test]
    fn interpolation_rejects_unterminated_expression() {
        let result = super::interpolate_env_vars("url = \"${CARTWISE_TEST");
        assert!(matches!(result, Err(ConfigError::UnterminatedInterpolation)));
    }

    #[test]
    fn log_format_parses_known_values() {
        assert_eq!("compact".parse::<LogFormat>().expect("compact"), LogFormat::Compact);
        assert_eq!("PRETTY".parse::<LogFormat>().expect("pretty"), LogFormat::Pretty);
        assert!("verbose".parse::<LogFormat>().is_err());
    }
}
