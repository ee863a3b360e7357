//! services/planner/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://lesson_planner.db?mode=rwc";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which hosted model family generates lessons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Gemini => "gemini-2.5-flash",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "gemini" => Ok(LlmProvider::Gemini),
            other => Err(format!("'{other}' is not a known provider (openai, gemini)")),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub log_level: Level,
    pub provider: LlmProvider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub lesson_model: String,
    pub storage_quota_bytes: Option<usize>,
    pub backup_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let provider = match lookup("LLM_PROVIDER") {
            Some(raw) => raw
                .parse::<LlmProvider>()
                .map_err(|e| ConfigError::InvalidValue("LLM_PROVIDER".to_string(), e))?,
            None => LlmProvider::OpenAi,
        };

        // --- Load API Keys (as optional) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        let lesson_model = lookup("LESSON_MODEL")
            .unwrap_or_else(|| provider.default_model().to_string());

        let storage_quota_bytes = lookup("STORAGE_QUOTA_BYTES")
            .map(|raw| {
                raw.trim().parse::<usize>().map_err(|e| {
                    ConfigError::InvalidValue("STORAGE_QUOTA_BYTES".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let backup_dir = lookup("BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            database_url,
            log_level,
            provider,
            openai_api_key,
            gemini_api_key,
            lesson_model,
            storage_quota_bytes,
            backup_dir,
        })
    }

    /// The API key for the selected provider, if any.
    pub fn provider_api_key(&self) -> Option<String> {
        match self.provider {
            LlmProvider::OpenAi => self.openai_api_key.clone(),
            LlmProvider::Gemini => self.gemini_api_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.provider, LlmProvider::OpenAi);
        assert_eq!(config.lesson_model, "gpt-4o-mini");
        assert_eq!(config.storage_quota_bytes, None);
        assert_eq!(config.backup_dir, PathBuf::from("."));
        assert!(config.provider_api_key().is_none());
    }

    #[test]
    fn gemini_provider_picks_its_key_and_model() {
        let config = config_from(&[
            ("LLM_PROVIDER", "Gemini"),
            ("GEMINI_API_KEY", "g-key"),
            ("OPENAI_API_KEY", "o-key"),
        ])
        .unwrap();
        assert_eq!(config.provider, LlmProvider::Gemini);
        assert_eq!(config.lesson_model, "gemini-2.5-flash");
        assert_eq!(config.provider_api_key().as_deref(), Some("g-key"));
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let config = config_from(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(config.provider_api_key().is_none());
    }

    #[test]
    fn invalid_values_are_reported_by_name() {
        let err = config_from(&[("STORAGE_QUOTA_BYTES", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "STORAGE_QUOTA_BYTES"));

        let err = config_from(&[("LLM_PROVIDER", "claude")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "LLM_PROVIDER"));

        let err = config_from(&[("RUST_LOG", "chatty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "RUST_LOG"));
    }
}
