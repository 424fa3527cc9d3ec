use thiserror::Error;

/// Errors returned to the caller of the chat core.
///
/// These cover misuse and setup problems only. Failures of the model server
/// itself never show up here; they come back as an [`Outcome`](crate::agent::Outcome)
/// and end up in the conversation as an assistant turn.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Model '{model_name}' is not in the configured model list")]
    UnknownModel { model_name: String },

    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Invalid value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    // ── Session errors ───────────────────────────────────────────────────────
    #[error("A request is already in flight for this session")]
    SessionBusy,

    #[error("Session was shut down before the request completed")]
    Cancelled,
}

impl AppError {
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidConfig { key: key.into(), message: message.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyField { .. } | AppError::UnknownModel { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let empty = AppError::EmptyField { field_name: "message".to_string() };
        assert!(empty.is_validation());
        assert!(AppError::UnknownModel { model_name: "gpt-9".to_string() }.is_validation());

        assert!(!AppError::SessionBusy.is_validation());
        assert!(!AppError::Cancelled.is_validation());
    }

    #[test]
    fn test_invalid_config_message() {
        let err = AppError::invalid_config("OLLAMA_TIMEOUT_SECS", "must be positive");
        assert_eq!(err.to_string(), "Invalid value for OLLAMA_TIMEOUT_SECS: must be positive");
    }
}
