//! Liveness endpoint.
//!
//! Does NOT check dependencies; a running process that can serve HTTP is
//! considered alive.

use axum::Json;
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Health {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version of the running binary
    pub version: &'static str,
}

/// `GET /health`
///
/// ```json
/// { "status": "ok", "version": "0.1.0" }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
