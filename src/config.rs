use std::time::Duration;

use reqwest::Url;

use crate::errors::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MODEL: &str = "phi";
pub const DEFAULT_MODELS: &[&str] =
    &["phi", "phi3", "llama3.1", "mistral", "llama3.2-vision:latest"];
pub const DEFAULT_GREETING: &str =
    "Hi! I'm an AI assistant powered by Ollama. How can I help you today?";

/// What to do when the server answers 2xx but the `response` field is
/// missing or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyResponsePolicy {
    /// Record an empty assistant turn.
    #[default]
    Accept,
    /// Treat it as a generic failure.
    Reject,
}

/// The fixed set of models a user may pick from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<String>,
    default_model: String,
}

impl ModelCatalog {
    pub fn new(models: Vec<String>, default_model: impl Into<String>) -> Result<Self, AppError> {
        let default_model = default_model.into();
        if models.is_empty() {
            return Err(AppError::invalid_config("OLLAMA_MODELS", "model list is empty"));
        }
        if !models.contains(&default_model) {
            return Err(AppError::invalid_config(
                "OLLAMA_MODEL",
                format!("'{default_model}' is not in the model list"),
            ));
        }
        Ok(Self { models, default_model })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub timeout: Duration,
    pub catalog: ModelCatalog,
    pub empty_response: EmptyResponsePolicy,
    /// Canned welcome turn; `None` starts the conversation empty.
    pub greeting: Option<String>,
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("DEFAULT_API_URL is a valid URL")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog: ModelCatalog::default(),
            empty_response: EmptyResponsePolicy::default(),
            greeting: Some(DEFAULT_GREETING.to_string()),
        }
    }
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup("OLLAMA_API_URL") {
            Some(raw) => Url::parse(raw.trim())
                .map_err(|e| AppError::invalid_config("OLLAMA_API_URL", e.to_string()))?,
            None => default_api_url(),
        };

        let timeout = match lookup("OLLAMA_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AppError::invalid_config(
                        "OLLAMA_TIMEOUT_SECS",
                        format!("'{raw}' is not a number"),
                    )
                })?;
                if secs == 0 {
                    return Err(AppError::invalid_config("OLLAMA_TIMEOUT_SECS", "must be positive"));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let models: Vec<String> = match lookup("OLLAMA_MODELS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };
        let default_model = lookup("OLLAMA_MODEL")
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let catalog = ModelCatalog::new(models, default_model)?;

        let empty_response = match lookup("OLLAMA_EMPTY_RESPONSE").as_deref().map(str::trim) {
            None | Some("accept") => EmptyResponsePolicy::Accept,
            Some("reject") => EmptyResponsePolicy::Reject,
            Some(other) => {
                return Err(AppError::invalid_config(
                    "OLLAMA_EMPTY_RESPONSE",
                    format!("expected 'accept' or 'reject', got '{other}'"),
                ))
            }
        };

        let greeting = match lookup("OLLAMA_GREETING") {
            Some(g) if g.trim().is_empty() => None,
            Some(g) => Some(g),
            None => Some(DEFAULT_GREETING.to_string()),
        };

        Ok(Self { api_url, timeout, catalog, empty_response, greeting })
    }
}
