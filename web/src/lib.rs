//! HTTP surface of the answers command service.
//!
//! # Request Flow
//!
//! 1. **Correlation id** taken from `X-Correlation-ID` or generated
//! 2. **Raw body** handed to [`AnswerCommandHandler::post_answer`]
//! 3. **Result** mapped to `200 "ok"`, `422` or `500` via [`AppError`]
//!
//! ```text
//! POST /answers   {"content":"hi","author":"u1","discussion":"d1"}
//! GET  /health
//! ```
//!
//! # Example
//!
//! ```ignore
//! use answers_web::{router, AppState};
//!
//! let app = router(AppState::new(Arc::new(handler)));
//! axum::serve(listener, app).await?;
//! ```
//!
//! [`AnswerCommandHandler::post_answer`]: answers_core::command::AnswerCommandHandler::post_answer

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use middleware::{correlation_id_layer, CorrelationId, CORRELATION_ID_HEADER};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

/// All routes, with request tracing and correlation ids.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/answers", post(handlers::post_answer))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
