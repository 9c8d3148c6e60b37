//! Local projections of upstream aggregates.
//!
//! # Overview
//!
//! Users and discussions are owned by other services. This service keeps a
//! local, eventually-consistent copy of each one, built by consuming their
//! event streams, so that a posted answer can be checked against them without
//! a synchronous call upstream.
//!
//! ```text
//! users topic ───────► users updater ─────────┐
//!                                             ▼
//!                                    ┌──────────────────┐
//!                                    │ ProjectionStore  │◄── exists? ── Command handler
//!                                    └──────────────────┘
//!                                             ▲
//! discussions topic ─► discussions updater ───┘
//! ```
//!
//! # Consistency
//!
//! - Entries are keyed by id; a later upsert replaces the whole entry
//!   (last-write-wins, no version check)
//! - An existence check observes every upsert that completed before it
//! - Nothing guarantees the store has caught up with the upstream service

use crate::types::{Discussion, User};
use std::future::Future;
use std::pin::Pin;

/// Error type for projection operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Boxed future returned by [`ProjectionStore`] methods.
pub type ProjectionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Id-keyed storage for the user and discussion projections.
///
/// Implementations must tolerate concurrent readers (command validation) and
/// writers (the updaters).
///
/// # Dyn Compatibility
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so the store can be shared as
/// `Arc<dyn ProjectionStore>`.
pub trait ProjectionStore: Send + Sync {
    /// Insert or replace a user.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Storage`] if the write fails.
    fn upsert_user(&self, user: User) -> ProjectionFuture<'_, ()>;

    /// Insert or replace a discussion.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Storage`] if the write fails.
    fn upsert_discussion(&self, discussion: Discussion) -> ProjectionFuture<'_, ()>;

    /// Whether a user with this id has been projected.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Storage`] if the lookup fails.
    fn user_exists<'a>(&'a self, id: &'a str) -> ProjectionFuture<'a, bool>;

    /// Whether a discussion with this id has been projected.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Storage`] if the lookup fails.
    fn discussion_exists<'a>(&'a self, id: &'a str) -> ProjectionFuture<'a, bool>;
}
