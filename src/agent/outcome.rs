use std::fmt;

/// Classified result of one call to the model server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { text: String },
    /// The server could not be reached. Carries the model so the rendered
    /// message can say how to start it.
    ConnectionFailed { model: String },
    Timeout,
    ServerError { status: u16, body: String },
    Generic { message: String, model: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    ConnectionFailed,
    Timeout,
    ServerError,
    Generic,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutcomeKind::Success => "success",
            OutcomeKind::ConnectionFailed => "connection_failed",
            OutcomeKind::Timeout => "timeout",
            OutcomeKind::ServerError => "server_error",
            OutcomeKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success { .. } => OutcomeKind::Success,
            Outcome::ConnectionFailed { .. } => OutcomeKind::ConnectionFailed,
            Outcome::Timeout => OutcomeKind::Timeout,
            Outcome::ServerError { .. } => OutcomeKind::ServerError,
            Outcome::Generic { .. } => OutcomeKind::Generic,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Text of the assistant turn this outcome becomes.
    ///
    /// Server error bodies go inside a code fence so markup in them is shown
    /// literally.
    pub fn render(&self) -> String {
        match self {
            Outcome::Success { text } => text.clone(),
            Outcome::ConnectionFailed { model } => format!(
                "Error: Could not connect to Ollama server.\n\n{}",
                start_hint(model)
            ),
            Outcome::Timeout => "Error: Request to Ollama timed out.\n\n\
                 The model might be taking too long to respond or Ollama might be overloaded."
                .to_string(),
            Outcome::ServerError { status, body } => {
                let fence = fence_for(body);
                format!("{fence}\nError: {status} - {body}\n{fence}")
            }
            Outcome::Generic { message, model } => format!(
                "Error connecting to Ollama: {message}\n\n{}",
                start_hint(model)
            ),
        }
    }
}

/// A backtick fence longer than any backtick run in `body`, so the body cannot
/// close it. At least three backticks.
fn fence_for(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}

fn start_hint(model: &str) -> String {
    format!(
        "Make sure Ollama is running with the selected model loaded. \
         You can start it with:\n```\nollama run {model}\n```"
    )
}
