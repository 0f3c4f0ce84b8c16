//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Interest batch defaults.
    #[serde(default)]
    pub interest: InterestConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// `lock_timeout` applied to every posting transaction, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "coopledger=info,sea_orm=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

/// Defaults for interest batch runs.
#[derive(Debug, Clone, Deserialize)]
pub struct InterestConfig {
    /// Days in the interest year.
    #[serde(default = "default_annual_divisor")]
    pub annual_divisor: u32,
    /// Windows shorter than this accrue nothing.
    #[serde(default = "default_minimum_period_days")]
    pub minimum_period_days: u32,
}

fn default_annual_divisor() -> u32 {
    365
}

fn default_minimum_period_days() -> u32 {
    30
}

impl Default for InterestConfig {
    fn default() -> Self {
        Self {
            annual_divisor: default_annual_divisor(),
            minimum_period_days: default_minimum_period_days(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COOPLEDGER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = config::Config::builder()
            .set_override("database.url", "postgres://localhost/coopledger")
            .unwrap()
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();

        assert_eq!(app.database.max_connections, 10);
        assert_eq!(app.database.lock_timeout_ms, 5000);
        assert_eq!(app.logging.format, LogFormat::Pretty);
        assert_eq!(app.logging.filter, "coopledger=info,sea_orm=warn");
        assert_eq!(app.interest.annual_divisor, 365);
        assert_eq!(app.interest.minimum_period_days, 30);
    }

    #[test]
    fn test_json_format_parses() {
        let config = config::Config::builder()
            .set_override("database.url", "postgres://localhost/coopledger")
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();
        assert_eq!(app.logging.format, LogFormat::Json);
    }
}
