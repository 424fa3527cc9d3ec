use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }

    /// Line prefix used when flattening history into a prompt.
    pub fn prompt_prefix(&self) -> &'static str {
        match self {
            Speaker::User => "User: ",
            Speaker::Assistant => "Assistant: ",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a turn came from. Only [`TurnKind::Message`] turns are replayed to
/// the model server; greetings and rendered errors are for the reader only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Message,
    Greeting,
    Error,
}

/// Position of a turn in its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(pub usize);

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One recorded message. Fields are read-only once the turn exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    id: TurnId,
    speaker: Speaker,
    kind: TurnKind,
    text: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub(crate) fn new(id: TurnId, speaker: Speaker, kind: TurnKind, text: String) -> Self {
        Self { id, speaker, kind, text, created_at: Utc::now() }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn kind(&self) -> TurnKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this turn is part of the context sent to the model.
    pub fn is_context(&self) -> bool {
        self.kind == TurnKind::Message
    }
}

// ── Wire types for the completion endpoint ───────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(model: &'a str, prompt: &'a str) -> Self {
        Self { model, prompt, stream: false }
    }
}

/// Decoded body of a successful generate call.
///
/// Only `response` is read; the server sends timing and context fields too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResponse {
    pub response: String,
}

impl GenerateResponse {
    /// The body must be a JSON object. A missing `response` reads as empty;
    /// one that is present but not a string (including `null`) is rejected.
    pub fn from_json(body: &str) -> Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
        let Some(object) = value.as_object() else {
            return Err("expected a JSON object".to_string());
        };
        match object.get("response") {
            None => Ok(Self { response: String::new() }),
            Some(serde_json::Value::String(text)) => Ok(Self { response: text.clone() }),
            Some(other) => Err(format!("'response' is not a string: {other}")),
        }
    }
}
