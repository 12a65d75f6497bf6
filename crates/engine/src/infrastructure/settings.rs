//! Engine settings.
//!
//! Layered with the `config` crate: built-in defaults, then a `.env` file
//! (via `dotenvy`), then `LEM_*` environment variables.

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Stamp created/updated columns on write (only for kinds that declare them)
    pub timestamps: bool,
    pub created_at_column: String,
    pub updated_at_column: String,
    /// Register the soft-delete scope on every repository
    pub soft_deletes: bool,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timestamps: true,
            created_at_column: "created_at".into(),
            updated_at_column: "updated_at".into(),
            soft_deletes: true,
            log_filter: "lem_engine=info".into(),
        }
    }
}

impl EngineSettings {
    /// Defaults, then `.env`, then `LEM_*` variables (e.g. `LEM_SOFT_DELETES=false`).
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        let config = Self::defaults()?
            .add_source(Environment::with_prefix("LEM").try_parsing(true))
            .build()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, SettingsError> {
        Ok(config.try_deserialize()?)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, SettingsError> {
        let defaults = Self::default();
        Ok(Config::builder()
            .set_default("timestamps", defaults.timestamps)?
            .set_default("created_at_column", defaults.created_at_column)?
            .set_default("updated_at_column", defaults.updated_at_column)?
            .set_default("soft_deletes", defaults.soft_deletes)?
            .set_default("log_filter", defaults.log_filter)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_config() {
        let config = EngineSettings::defaults().unwrap().build().unwrap();
        let settings = EngineSettings::from_config(config).unwrap();
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn overrides_win_over_defaults() {
        let config = EngineSettings::defaults()
            .unwrap()
            .set_override("soft_deletes", false)
            .unwrap()
            .set_override("log_filter", "lem_engine=debug")
            .unwrap()
            .build()
            .unwrap();
        let settings = EngineSettings::from_config(config).unwrap();

        assert!(!settings.soft_deletes);
        assert!(settings.timestamps);
        assert_eq!(settings.log_filter, "lem_engine=debug");
    }
}
