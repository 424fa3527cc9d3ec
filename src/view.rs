use crate::models::Speaker;

/// The display layer as seen from the core.
///
/// The session calls `render_turn` once for every turn it appends, in append
/// order, and asks `current_model` when a message is sent. Nothing else.
pub trait ChatView: Send + Sync {
    fn render_turn(&self, speaker: Speaker, text: &str);

    fn current_model(&self) -> String;
}
