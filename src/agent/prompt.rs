use crate::models::{Speaker, Turn};

/// Everything needed to build one request: the selected model, the new user
/// message, and the history that came before it.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub model: &'a str,
    pub message: &'a str,
    pub history: &'a [Turn],
}

impl<'a> RequestContext<'a> {
    pub fn new(model: &'a str, message: &'a str, history: &'a [Turn]) -> Self {
        Self { model, message, history }
    }

    pub fn prompt(&self) -> String {
        build_prompt(self.history, self.message)
    }
}

/// Flattens prior turns plus the new message into a single completion prompt.
///
/// The completion endpoint keeps no chat state, so the whole transcript is
/// replayed every call. Greeting and error turns are skipped. With no prior
/// context the message is sent as-is; otherwise each turn becomes a
/// `User: ...` / `Assistant: ...` line and the prompt ends with an open
/// `Assistant:` cue.
pub fn build_prompt(history: &[Turn], new_message: &str) -> String {
    let mut context = history.iter().filter(|turn| turn.is_context()).peekable();
    if context.peek().is_none() {
        return new_message.to_string();
    }

    let mut prompt = String::new();
    for turn in context {
        prompt.push_str(turn.speaker().prompt_prefix());
        prompt.push_str(turn.text());
        prompt.push('\n');
    }
    prompt.push_str(Speaker::User.prompt_prefix());
    prompt.push_str(new_message);
    prompt.push_str("\nAssistant:");
    prompt
}
