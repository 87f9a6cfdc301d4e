//! Startup configuration, read from the environment.

use std::env;
use std::fmt::{self, Debug};

use lang_search_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

/// Holds the API key of the model provider.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
/// Overrides the model name.
pub const MODEL_VAR: &str = "GROQ_MODEL";
/// Overrides the provider endpoint.
pub const BASE_URL_VAR: &str = "GROQ_BASE_URL";

/// Errors that prevent the assistant from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required credential is missing or empty.
    #[error("{0} is not set, add it to the environment or a .env file")]
    MissingCredential(&'static str),
    /// The HTTP client for the lookup tools could not be created.
    #[error("failed to create the HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Settings for the model provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// Variables from a `.env` file in the working directory (or one of its
    /// parents) are loaded first, without overriding variables that are
    /// already set.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("loaded environment from {}", path.display()),
            Err(err) if err.not_found() => trace!("no .env file found"),
            Err(err) => warn!("failed to load .env file: {err}"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key).filter(|value| !value.trim().is_empty())
        };

        let api_key = read(API_KEY_VAR)
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;
        Ok(Self {
            api_key,
            model: read(MODEL_VAR),
            base_url: read(BASE_URL_VAR),
        })
    }

    /// Returns the configured model name, if overridden.
    #[inline]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns the configured endpoint, if overridden.
    #[inline]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Builds the provider configuration, filling in defaults.
    pub fn to_openai_config(&self) -> OpenAIConfig {
        let mut builder = OpenAIConfigBuilder::with_api_key(&self.api_key);
        if let Some(model) = &self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lang_search_openai_model::{DEFAULT_BASE_URL, DEFAULT_MODEL};

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_credential() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("GROQ_API_KEY")));
        assert!(err.to_string().starts_with("GROQ_API_KEY is not set"));

        let err = Config::from_lookup(lookup(&[("GROQ_API_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[("GROQ_API_KEY", "gsk-test")]))
                .unwrap();
        assert_eq!(config.model(), None);

        let openai_config = config.to_openai_config();
        assert_eq!(openai_config.model(), DEFAULT_MODEL);
        assert_eq!(openai_config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("GROQ_MODEL", "llama-3.1-8b-instant"),
            ("GROQ_BASE_URL", "http://localhost:8080/v1/"),
            ("OPENAI_API_KEY", "ignored"),
        ]))
        .unwrap();

        let openai_config = config.to_openai_config();
        assert_eq!(openai_config.model(), "llama-3.1-8b-instant");
        assert_eq!(openai_config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config =
            Config::from_lookup(lookup(&[("GROQ_API_KEY", "gsk-secret")]))
                .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("gsk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
