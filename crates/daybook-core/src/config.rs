use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, Result};

pub const DEFAULT_CHANGE_BUFFER: usize = 256; // pending store changes per subscriber
pub const DEFAULT_LOG_FILTER: &str = "daybook=info,daybook_schedule=info";
pub const ENV_PREFIX: &str = "DAYBOOK_";

/// Top-level config (daybook.toml + DAYBOOK_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaybookConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Reactive query tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Capacity of the store's change broadcast. A subscriber that falls
    /// further behind than this re-queries once instead of replaying.
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            change_buffer: DEFAULT_CHANGE_BUFFER,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_change_buffer() -> usize {
    DEFAULT_CHANGE_BUFFER
}
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.daybook/daybook.db", home)
}

impl DaybookConfig {
    /// Load config from a TOML file with DAYBOOK_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.daybook/daybook.toml
    ///
    /// A missing file is not an error: every section has defaults. Nested keys
    /// are addressed with a double underscore, e.g. `DAYBOOK_DATABASE__PATH`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: DaybookConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        if config.stream.change_buffer == 0 {
            return Err(CoreError::Config(
                "stream.change_buffer must be at least 1".to_string(),
            ));
        }

        debug!(path = %path, database = %config.database.path, "config loaded");
        Ok(config)
    }

    /// Create the directory that will hold the database file, if any.
    pub fn ensure_database_dir(&self) -> Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.daybook/daybook.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = DaybookConfig::load(Some("absent.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.stream.change_buffer, DEFAULT_CHANGE_BUFFER);
            assert_eq!(config.log.filter, DEFAULT_LOG_FILTER);
            assert!(config.database.path.ends_with(".daybook/daybook.db"));
            Ok(())
        });
    }

    #[test]
    fn file_values_are_read() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "daybook.toml",
                r#"
                [database]
                path = "/var/lib/daybook/test.db"

                [stream]
                change_buffer = 16
                "#,
            )?;
            let config = DaybookConfig::load(Some("daybook.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.database.path, "/var/lib/daybook/test.db");
            assert_eq!(config.stream.change_buffer, 16);
            assert_eq!(config.log.filter, DEFAULT_LOG_FILTER);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("daybook.toml", "[database]\npath = \"from-file.db\"\n")?;
            jail.set_env("DAYBOOK_DATABASE__PATH", "from-env.db");
            jail.set_env("DAYBOOK_LOG__FILTER", "debug");
            let config = DaybookConfig::load(Some("daybook.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.database.path, "from-env.db");
            assert_eq!(config.log.filter, "debug");
            Ok(())
        });
    }

    #[test]
    fn zero_change_buffer_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("daybook.toml", "[stream]\nchange_buffer = 0\n")?;
            let err = DaybookConfig::load(Some("daybook.toml")).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            Ok(())
        });
    }

    #[test]
    fn ensure_database_dir_creates_parent() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested/dir/daybook.db");
            let config = DaybookConfig {
                database: DatabaseConfig {
                    path: path.to_string_lossy().into_owned(),
                },
                ..DaybookConfig::default()
            };
            config.ensure_database_dir().map_err(|e| e.to_string())?;
            assert!(jail.directory().join("nested/dir").is_dir());
            Ok(())
        });
    }
}
