use config::{Config, ConfigError, Environment, File, Map};
use serde::Deserialize;
use std::path::Path;

use crate::schedule::ScheduleConfig;

/// Environment variable naming an optional TOML settings file.
pub const CONFIG_PATH_VAR: &str = "SEASON_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default = "default_rust_log")]
    pub rust_log: String,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "sessions.db".to_string()
}

fn default_rust_log() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads settings from the file named by `SEASON_CONFIG` (if set), then
    /// `SEASON__*` environment variables, e.g. `SEASON__SERVER__PORT=9000` or
    /// `SEASON__SCHEDULE__STRICT_WEEKDAYS=true`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).ok();
        Self::load(path.as_deref().map(Path::new))
    }

    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, None)
    }

    /// Like [`Settings::load`], but reads `SEASON__*` variables from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(
                Environment::with_prefix("SEASON")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize::<Settings>()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
