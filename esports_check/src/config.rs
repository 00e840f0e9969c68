//! Check configuration management.
//!
//! Consolidates environment variable reads and command-line overrides into
//! one validated configuration.

use chrono::NaiveDate;
use esports_db::db::DatabaseConfig;

/// Number of sample matches printed when nothing else is configured
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Upper bound on `--sample`
pub const MAX_SAMPLE_SIZE: usize = 500;

/// Values given on the command line; `None` defers to the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub apply_schema: bool,
    pub smoke: bool,
    pub in_memory: bool,
    pub as_of: Option<NaiveDate>,
    pub json: bool,
    pub sample_size: Option<usize>,
}

/// Complete check configuration
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Create missing tables before checking
    pub apply_schema: bool,
    /// Run the create/read/update/delete pass
    pub smoke: bool,
    /// Use a throwaway in-memory store instead of PostgreSQL
    pub in_memory: bool,
    /// Date for the map pool report (`None` means today)
    pub as_of: Option<NaiveDate>,
    /// Print one JSON document instead of tables
    pub json: bool,
    /// Sample matches to print
    pub sample_size: usize,
}

impl CheckConfig {
    /// Load configuration from environment variables, then apply `overrides`
    ///
    /// Recognized variables besides the `DATABASE_URL`/`DB_*` family:
    /// - `CHECK_APPLY_SCHEMA` (false)
    /// - `CHECK_SAMPLE_SIZE` ([`DEFAULT_SAMPLE_SIZE`])
    ///
    /// # Errors
    ///
    /// Returns error if a recognized variable is set but unparseable
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut database = DatabaseConfig::from_env();
        if let Some(url) = overrides.database_url {
            database = database.with_url(url);
        }

        let apply_schema =
            overrides.apply_schema || parse_env("CHECK_APPLY_SCHEMA")?.unwrap_or(false);
        let sample_size = match overrides.sample_size {
            Some(n) => n,
            None => parse_env("CHECK_SAMPLE_SIZE")?.unwrap_or(DEFAULT_SAMPLE_SIZE),
        };

        Ok(CheckConfig {
            database,
            apply_schema,
            smoke: overrides.smoke,
            in_memory: overrides.in_memory,
            as_of: overrides.as_of,
            json: overrides.json,
            sample_size,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.in_memory {
            let url = &self.database.database_url;
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(ConfigError::Invalid {
                    var: "DATABASE_URL".to_string(),
                    reason: "Must be a postgres:// or postgresql:// URL".to_string(),
                });
            }
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.sample_size > MAX_SAMPLE_SIZE {
            return Err(ConfigError::Invalid {
                var: "CHECK_SAMPLE_SIZE".to_string(),
                reason: format!("Must be at most {MAX_SAMPLE_SIZE}"),
            });
        }

        if self.in_memory && self.apply_schema {
            return Err(ConfigError::Conflict {
                first: "--in-memory".to_string(),
                second: "--apply-schema".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("{first} cannot be combined with {second}")]
    Conflict { first: String, second: String },
}

/// Reads `key`, treating an unset variable as `None` and a bad value as an error
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Could not parse {raw:?}"),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CheckConfig {
        CheckConfig {
            database: DatabaseConfig::development(),
            apply_schema: false,
            smoke: false,
            in_memory: false,
            as_of: None,
            json: false,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_postgres_url() {
        let mut config = base();
        config.database = config.database.with_url("mysql://localhost/league");

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DATABASE_URL"));
    }

    #[test]
    fn test_in_memory_ignores_url() {
        let mut config = base();
        config.in_memory = true;
        config.database = config.database.with_url("");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_connections_above_max() {
        let mut config = base();
        config.database.min_connections = config.database.max_connections + 1;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DB_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_sample_size_bound() {
        let mut config = base();
        config.sample_size = MAX_SAMPLE_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_in_memory_conflicts_with_schema() {
        let mut config = base();
        config.in_memory = true;
        config.apply_schema = true;

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "--in-memory cannot be combined with --apply-schema"
        );
    }
}
