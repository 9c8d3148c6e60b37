//! Application state for Axum handlers.

use answers_core::command::AnswerCommandHandler;
use std::sync::Arc;

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handles `POST /answers`
    pub commands: Arc<AnswerCommandHandler>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(commands: Arc<AnswerCommandHandler>) -> Self {
        Self { commands }
    }
}
