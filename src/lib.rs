//! Conversation core for chatting with a locally hosted Ollama server.
//!
//! A [`Session`] owns the turn history ([`ConversationStore`]) and a
//! [`ModelClient`]. Each `send` replays the history as one prompt against the
//! completion endpoint and records exactly one assistant turn, either the
//! reply or a rendered failure.

pub mod agent;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;
pub mod store;
pub mod view;

pub use agent::{build_prompt, ModelClient, Outcome, OutcomeKind, RequestContext};
pub use config::{Config, EmptyResponsePolicy, ModelCatalog};
pub use errors::AppError;
pub use models::{Speaker, Turn, TurnId, TurnKind};
pub use service::session::{Session, SessionState};
pub use store::{ConversationStore, HistoryReader};
pub use view::ChatView;
