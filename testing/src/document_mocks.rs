//! In-memory document store.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use answers_core::persistence::{
    Collection, DocumentStore, PersistenceError, PersistenceFuture,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

type Documents = HashMap<Collection, HashMap<String, serde_json::Value>>;

/// HashMap-backed [`DocumentStore`] with failure injection.
///
/// # Example
///
/// ```
/// use answers_testing::InMemoryDocumentStore;
/// use answers_core::persistence::{Collection, DocumentStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryDocumentStore::new();
/// store.insert(Collection::Answers, "a1", serde_json::json!({"id": "a1"})).await?;
/// assert_eq!(store.count_by_id(Collection::Answers, "a1").await?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<Documents>>,
    failure: Arc<Mutex<Option<String>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored document, if any.
    pub async fn get(&self, collection: Collection, id: &str) -> Option<serde_json::Value> {
        self.documents
            .read()
            .await
            .get(&collection)
            .and_then(|documents| documents.get(id))
            .cloned()
    }

    /// Number of documents in `collection`.
    pub async fn len(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .get(&collection)
            .map_or(0, HashMap::len)
    }

    /// Make every following operation fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    /// Stop injecting failures.
    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Number of insert/upsert calls made so far, failed ones included.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), PersistenceError> {
        match self.failure.lock().unwrap().as_ref() {
            Some(reason) => Err(PersistenceError::Database(reason.clone())),
            None => Ok(()),
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        document: serde_json::Value,
    ) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.check_failure()?;

            let mut documents = self.documents.write().await;
            let entries = documents.entry(collection).or_default();
            if entries.contains_key(id) {
                return Err(PersistenceError::Duplicate {
                    collection,
                    id: id.to_string(),
                });
            }
            entries.insert(id.to_string(), document);
            Ok(())
        })
    }

    fn upsert<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        document: serde_json::Value,
    ) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.check_failure()?;

            self.documents
                .write()
                .await
                .entry(collection)
                .or_default()
                .insert(id.to_string(), document);
            Ok(())
        })
    }

    fn count_by_id<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> PersistenceFuture<'a, u64> {
        Box::pin(async move {
            self.check_failure()?;
            Ok(self.get(collection, id).await.map_or(0, |_| 1))
        })
    }
}
