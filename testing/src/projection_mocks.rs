//! In-memory projection store.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use answers_core::projection::{ProjectionError, ProjectionFuture, ProjectionStore};
use answers_core::types::{Discussion, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// In-memory projection store for fast, deterministic testing.
///
/// One `RwLock` per collection; upserts replace the whole entity.
///
/// # Example
///
/// ```
/// use answers_testing::{InMemoryProjectionStore, fixtures};
/// use answers_core::projection::ProjectionStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryProjectionStore::new();
///
/// store.upsert_user(fixtures::user("u1")).await?;
/// assert!(store.user_exists("u1").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryProjectionStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    discussions: Arc<RwLock<HashMap<String, Discussion>>>,
    failure: Arc<Mutex<Option<String>>>,
    user_lookup_failure: Arc<Mutex<Option<String>>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryProjectionStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Projected user, if any.
    pub async fn user(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    /// Projected discussion, if any.
    pub async fn discussion(&self, id: &str) -> Option<Discussion> {
        self.discussions.read().await.get(id).cloned()
    }

    /// Total number of projected entities.
    pub async fn len(&self) -> usize {
        self.users.read().await.len() + self.discussions.read().await.len()
    }

    /// Whether nothing has been projected.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove every entity (for test isolation).
    pub async fn clear(&self) {
        self.users.write().await.clear();
        self.discussions.write().await.clear();
    }

    /// Make every following operation fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    /// Make only `user_exists` fail with `reason`; everything else keeps
    /// working.
    pub fn fail_user_lookups_with(&self, reason: impl Into<String>) {
        *self.user_lookup_failure.lock().unwrap() = Some(reason.into());
    }

    /// Stop injecting failures.
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
        *self.user_lookup_failure.lock().unwrap() = None;
    }

    /// Number of existence checks performed so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), ProjectionError> {
        injected(&self.failure)
    }
}

fn injected(failure: &Mutex<Option<String>>) -> Result<(), ProjectionError> {
    match failure.lock().unwrap().as_ref() {
        Some(reason) => Err(ProjectionError::Storage(reason.clone())),
        None => Ok(()),
    }
}

impl ProjectionStore for InMemoryProjectionStore {
    fn upsert_user(&self, user: User) -> ProjectionFuture<'_, ()> {
        Box::pin(async move {
            self.check_failure()?;
            self.users.write().await.insert(user.id.clone(), user);
            Ok(())
        })
    }

    fn upsert_discussion(&self, discussion: Discussion) -> ProjectionFuture<'_, ()> {
        Box::pin(async move {
            self.check_failure()?;
            self.discussions
                .write()
                .await
                .insert(discussion.id.clone(), discussion);
            Ok(())
        })
    }

    fn user_exists<'a>(&'a self, id: &'a str) -> ProjectionFuture<'a, bool> {
        Box::pin(async move {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.check_failure()?;
            injected(&self.user_lookup_failure)?;
            Ok(self.users.read().await.contains_key(id))
        })
    }

    fn discussion_exists<'a>(&'a self, id: &'a str) -> ProjectionFuture<'a, bool> {
        Box::pin(async move {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.check_failure()?;
            Ok(self.discussions.read().await.contains_key(id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn upsert_is_idempotent_per_id() {
        let store = InMemoryProjectionStore::new();

        store.upsert_user(fixtures::user("u1")).await.unwrap();
        let mut renamed = fixtures::user("u1");
        renamed.first_name = "Grace".to_string();
        store.upsert_user(renamed.clone()).await.unwrap();
        store.upsert_user(fixtures::user("u2")).await.unwrap();

        assert_eq!(store.user("u1").await, Some(renamed));
        assert_eq!(store.user("u2").await, Some(fixtures::user("u2")));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn users_and_discussions_are_separate() {
        let store = InMemoryProjectionStore::new();
        store.upsert_user(fixtures::user("x")).await.unwrap();

        assert!(store.user_exists("x").await.unwrap());
        assert!(!store.discussion_exists("x").await.unwrap());
        assert_eq!(store.lookups(), 2);
    }

    #[tokio::test]
    async fn injected_failure_is_a_storage_error() {
        let store = InMemoryProjectionStore::new();
        store.fail_with("down");

        assert!(matches!(
            store.discussion_exists("d1").await,
            Err(ProjectionError::Storage(reason)) if reason == "down"
        ));

        store.recover();
        assert!(!store.discussion_exists("d1").await.unwrap());
    }

    #[tokio::test]
    async fn user_lookup_failure_spares_other_operations() {
        let store = InMemoryProjectionStore::new();
        store.fail_user_lookups_with("users down");

        store.upsert_user(fixtures::user("u1")).await.unwrap();
        assert!(!store.discussion_exists("d1").await.unwrap());
        assert!(matches!(
            store.user_exists("u1").await,
            Err(ProjectionError::Storage(reason)) if reason == "users down"
        ));

        store.recover();
        assert!(store.user_exists("u1").await.unwrap());
    }

    #[tokio::test]
    async fn clear_empties_both_collections() {
        let store = InMemoryProjectionStore::new();
        store.upsert_user(fixtures::user("u1")).await.unwrap();
        store
            .upsert_discussion(fixtures::discussion("d1"))
            .await
            .unwrap();

        store.clear().await;
        assert!(store.is_empty().await);
    }
}
