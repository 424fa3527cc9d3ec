use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use ollama_chat::{AppError, ChatView, Config, ModelCatalog, Session, Speaker};

/// Plain-text front end: prints each turn to stdout and keeps the model
/// selection made with `/model`.
struct TerminalView {
    catalog: ModelCatalog,
    model: RwLock<String>,
}

impl TerminalView {
    fn new(catalog: ModelCatalog) -> Self {
        let model = RwLock::new(catalog.default_model().to_string());
        Self { catalog, model }
    }

    fn select(&self, name: &str) -> Result<(), AppError> {
        if !self.catalog.contains(name) {
            return Err(AppError::UnknownModel { model_name: name.to_string() });
        }
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = name.to_string();
        Ok(())
    }

    fn print_models(&self) {
        let current = self.current_model();
        for model in self.catalog.models() {
            let marker = if *model == current { "*" } else { " " };
            println!("{marker} {model}");
        }
    }
}

impl ChatView for TerminalView {
    fn render_turn(&self, speaker: Speaker, text: &str) {
        let label = match speaker {
            Speaker::User => "You",
            Speaker::Assistant => "AI Assistant",
        };
        println!("{label}:\n{text}\n");
    }

    fn current_model(&self) -> String {
        self.model.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Logs go to stderr so they stay out of the transcript
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ollama_chat=info".into()),
        )
        .init();

    // ── Session wiring ────────────────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load configuration")?;
    let view = Arc::new(TerminalView::new(config.catalog.clone()));
    let session = Session::new(config, view.clone()).await?;

    println!(
        "Model: {} (commands: /models, /model <name>, /history, /quit)\n",
        view.current_model()
    );

    // ── Input loop ────────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                session.shutdown();
                break;
            }
        };
        let Some(line) = line else { break };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" => break,
            "/models" => view.print_models(),
            "/history" => {
                for turn in session.history().await {
                    view.render_turn(turn.speaker(), turn.text());
                }
            }
            _ if input.starts_with("/model ") => {
                let name = input.trim_start_matches("/model ").trim();
                match view.select(name) {
                    Ok(()) => println!("Model: {name}\n"),
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ => {
                tokio::select! {
                    result = session.send(input) => match result {
                        Ok(_) => {}
                        Err(e) if e.is_validation() => eprintln!("{e}"),
                        Err(e) => warn!("Send failed: {e}"),
                    },
                    _ = tokio::signal::ctrl_c() => {
                        session.shutdown();
                        break;
                    }
                }
            }
        }
    }

    info!("Session {} closed", session.id());
    Ok(())
}
