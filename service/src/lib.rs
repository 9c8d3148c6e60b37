//! # Answers Service
//!
//! Configuration, wiring and lifecycle of the answers command service.
//!
//! ```text
//! users ─────────► users-projection ───────┐
//!                                          ▼
//! discussions ───► discussions-projection ─► PostgreSQL ◄─── POST /answers ───► answers
//! ```

pub mod config;
pub mod lifecycle;
pub mod metrics;

pub use config::Config;
pub use lifecycle::Application;
