use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::{ModelClient, Outcome, RequestContext};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Speaker, Turn, TurnKind};
use crate::store::{ConversationStore, HistoryReader};
use crate::view::ChatView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

/// One conversation: its history, the client used to continue it, and the
/// view that displays it.
///
/// Clones share the same conversation. Only one message may be in flight at a
/// time; a second `send` while one is outstanding is rejected with
/// [`AppError::SessionBusy`] and leaves history untouched.
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    config: Arc<Config>,
    store: ConversationStore,
    client: ModelClient,
    view: Arc<dyn ChatView>,
    in_flight: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl Session {
    pub async fn new(config: Config, view: Arc<dyn ChatView>) -> Result<Self, AppError> {
        let client = ModelClient::new(&config)?;
        let session = Self {
            id: Uuid::new_v4(),
            config: Arc::new(config),
            store: ConversationStore::new(),
            client,
            view,
            in_flight: Arc::new(Semaphore::new(1)),
            shutdown: CancellationToken::new(),
        };

        if let Some(greeting) = session.config.greeting.as_deref() {
            session.store.append_greeting(greeting).await;
            session.view.render_turn(Speaker::Assistant, greeting);
        }
        info!("Session {} started against {}", session.id, session.client.api_url());
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read-only handle onto this session's history.
    pub fn history_reader(&self) -> HistoryReader {
        self.store.reader()
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.store.history().await
    }

    pub fn state(&self) -> SessionState {
        if self.in_flight.available_permits() == 0 {
            SessionState::Sending
        } else {
            SessionState::Idle
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Aborts any outstanding request and refuses further sends.
    pub fn shutdown(&self) {
        info!("Session {} shutting down", self.id);
        self.shutdown.cancel();
    }

    /// Sends one user message and records the reply.
    ///
    /// On success the returned turn is the assistant's: either the model's
    /// reply or the rendered failure. Model-server failures never surface as
    /// `Err`; only misuse (empty text, unknown model, busy, shut down) does.
    pub async fn send(&self, text: &str) -> Result<Turn, AppError> {
        let message = text.trim();
        if message.is_empty() {
            return Err(AppError::EmptyField { field_name: "message".to_string() });
        }
        if self.shutdown.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let _permit = self.in_flight.try_acquire().map_err(|_| {
            warn!("Session {} rejected a send while a request is in flight", self.id);
            AppError::SessionBusy
        })?;

        let model = self.view.current_model();
        if !self.config.catalog.contains(&model) {
            return Err(AppError::UnknownModel { model_name: model });
        }

        // The user turn is shown right away but only stored together with its
        // reply, so an abandoned request leaves history unchanged.
        let prior = self.store.history().await;
        self.view.render_turn(Speaker::User, message);

        let ctx = RequestContext::new(&model, message, &prior);
        let outcome = tokio::select! {
            outcome = self.client.complete(&ctx) => outcome,
            _ = self.shutdown.cancelled() => {
                info!("Session {} abandoned its in-flight request", self.id);
                return Err(AppError::Cancelled);
            }
        };

        info!("Session {} turn finished: {}", self.id, outcome.kind());
        let (reply_kind, reply_text) = match outcome {
            Outcome::Success { text } => (TurnKind::Message, text),
            failure => (TurnKind::Error, failure.render()),
        };
        let (_, reply) = self
            .store
            .append_exchange(message.to_string(), reply_kind, reply_text)
            .await;
        self.view.render_turn(reply.speaker(), reply.text());
        Ok(reply)
    }
}
