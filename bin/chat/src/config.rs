//! Centralized application configuration.
//!
//! Loaded via the `config` crate from an optional `skychat.toml` in the
//! working directory, overridden by `SKYCHAT_`-prefixed environment
//! variables with `__` between nested keys (for example
//! `SKYCHAT_OLLAMA__BASE_URL`).

use serde::Deserialize;
use skychat_ai::OllamaConfig;
use skychat_scheduler::CleanupConfig;
use skychat_tools::WeatherConfig;

/// Application configuration composed from library configs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Chat backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Weather lookup settings.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Session cleanup settings.
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl AppConfig {
    /// Loads configuration from `skychat.toml` (if present) and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or a value has the wrong
    /// type.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name("skychat").required(false)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder
            .add_source(
                config::Environment::with_prefix("SKYCHAT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str) -> AppConfig {
        AppConfig::from_builder(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
        .unwrap()
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let config = from_toml("");

        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.ollama.default_model, "llama3.2:latest");
        assert_eq!(config.weather.base_url, "https://wttr.in");
        assert_eq!(config.cleanup.interval_minutes, 30);
        assert_eq!(config.cleanup.max_session_age_hours, 24);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = from_toml(
            r#"
            [ollama]
            default_model = "mistral"

            [cleanup]
            max_session_age_hours = 2
            "#,
        );

        assert_eq!(config.ollama.default_model, "mistral");
        assert_eq!(config.ollama.timeout_seconds, 30);
        assert_eq!(config.cleanup.max_session_age_hours, 2);
        assert_eq!(config.cleanup.interval_minutes, 30);
    }
}
