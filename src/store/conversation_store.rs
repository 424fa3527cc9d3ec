use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Speaker, Turn, TurnId, TurnKind};

/// Append-only, in-memory turn history for one conversation.
///
/// Cloning gives another handle onto the same history. Appends hold the write
/// lock for the whole push, so a concurrent reader sees either all of a turn
/// or none of it.
#[derive(Clone, Default)]
pub struct ConversationStore {
    turns: Arc<RwLock<Vec<Turn>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ordinary message turn.
    pub async fn append(&self, speaker: Speaker, text: impl Into<String>) -> TurnId {
        let mut turns = self.turns.write().await;
        push(&mut turns, speaker, TurnKind::Message, text.into()).id()
    }

    /// Appends the canned assistant welcome. It is never sent to the model.
    pub async fn append_greeting(&self, text: impl Into<String>) -> TurnId {
        let mut turns = self.turns.write().await;
        push(&mut turns, Speaker::Assistant, TurnKind::Greeting, text.into()).id()
    }

    /// Appends a user message and the assistant turn answering it under one
    /// write lock, so no reader ever sees the user turn on its own.
    pub(crate) async fn append_exchange(
        &self,
        user_text: String,
        reply_kind: TurnKind,
        reply_text: String,
    ) -> (Turn, Turn) {
        let mut turns = self.turns.write().await;
        let user = push(&mut turns, Speaker::User, TurnKind::Message, user_text);
        let reply = push(&mut turns, Speaker::Assistant, reply_kind, reply_text);
        (user, reply)
    }

    /// Read-only handle onto the same history.
    pub fn reader(&self) -> HistoryReader {
        HistoryReader { store: self.clone() }
    }

    /// Snapshot of every turn in insertion order.
    pub async fn history(&self) -> Vec<Turn> {
        self.turns.read().await.clone()
    }

    pub async fn get(&self, id: TurnId) -> Option<Turn> {
        self.turns.read().await.get(id.0).cloned()
    }

    pub async fn last(&self) -> Option<Turn> {
        self.turns.read().await.last().cloned()
    }

    pub async fn len(&self) -> usize {
        self.turns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.turns.read().await.is_empty()
    }
}

fn push(turns: &mut Vec<Turn>, speaker: Speaker, kind: TurnKind, text: String) -> Turn {
    let id = TurnId(turns.len());
    debug!("Appending {kind:?} turn {id} from {speaker} ({} bytes)", text.len());
    let turn = Turn::new(id, speaker, kind, text);
    turns.push(turn.clone());
    turn
}

/// View of a [`ConversationStore`] that cannot append.
#[derive(Clone)]
pub struct HistoryReader {
    store: ConversationStore,
}

impl HistoryReader {
    pub async fn history(&self) -> Vec<Turn> {
        self.store.history().await
    }

    pub async fn get(&self, id: TurnId) -> Option<Turn> {
        self.store.get(id).await
    }

    pub async fn last(&self) -> Option<Turn> {
        self.store.last().await
    }

    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }
}
