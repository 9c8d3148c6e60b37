//! Document-backed projection store.

use answers_core::persistence::{Collection, DocumentStore, PersistenceError};
use answers_core::projection::{ProjectionError, ProjectionFuture, ProjectionStore};
use answers_core::types::{Discussion, User};
use std::sync::Arc;

/// [`ProjectionStore`] over the `users` and `discussions` collections of a
/// [`DocumentStore`].
///
/// Upserts replace the whole document; existence checks count documents by id.
///
/// # Example
///
/// ```ignore
/// let documents = Arc::new(PostgresDocumentStore::connect(&url, 10).await?);
/// let store = DocumentProjectionStore::new(documents);
///
/// store.upsert_user(user).await?;
/// assert!(store.user_exists("u1").await?);
/// ```
pub struct DocumentProjectionStore<D: DocumentStore> {
    documents: Arc<D>,
}

impl<D: DocumentStore> DocumentProjectionStore<D> {
    /// Create a projection store over `documents`.
    #[must_use]
    pub const fn new(documents: Arc<D>) -> Self {
        Self { documents }
    }

    async fn upsert<T: serde::Serialize + Sync>(
        &self,
        collection: Collection,
        id: &str,
        entity: &T,
    ) -> Result<(), ProjectionError> {
        let document = serde_json::to_value(entity)
            .map_err(|e| ProjectionError::Serialization(e.to_string()))?;

        self.documents
            .upsert(collection, id, document)
            .await
            .map_err(storage_error)
    }

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool, ProjectionError> {
        let count = self
            .documents
            .count_by_id(collection, id)
            .await
            .map_err(storage_error)?;
        Ok(count > 0)
    }
}

impl<D: DocumentStore> Clone for DocumentProjectionStore<D> {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
        }
    }
}

fn storage_error(error: PersistenceError) -> ProjectionError {
    ProjectionError::Storage(error.to_string())
}

impl<D: DocumentStore> ProjectionStore for DocumentProjectionStore<D> {
    fn upsert_user(&self, user: User) -> ProjectionFuture<'_, ()> {
        Box::pin(async move { self.upsert(Collection::Users, &user.id, &user).await })
    }

    fn upsert_discussion(&self, discussion: Discussion) -> ProjectionFuture<'_, ()> {
        Box::pin(async move {
            self.upsert(Collection::Discussions, &discussion.id, &discussion)
                .await
        })
    }

    fn user_exists<'a>(&'a self, id: &'a str) -> ProjectionFuture<'a, bool> {
        Box::pin(self.exists(Collection::Users, id))
    }

    fn discussion_exists<'a>(&'a self, id: &'a str) -> ProjectionFuture<'a, bool> {
        Box::pin(self.exists(Collection::Discussions, id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use answers_testing::{InMemoryDocumentStore, fixtures};

    fn store() -> (Arc<InMemoryDocumentStore>, DocumentProjectionStore<InMemoryDocumentStore>) {
        let documents = Arc::new(InMemoryDocumentStore::new());
        (Arc::clone(&documents), DocumentProjectionStore::new(documents))
    }

    #[tokio::test]
    async fn upserted_user_exists() {
        let (documents, store) = store();

        assert!(!store.user_exists("u1").await.unwrap());
        store.upsert_user(fixtures::user("u1")).await.unwrap();

        assert!(store.user_exists("u1").await.unwrap());
        assert!(!store.discussion_exists("u1").await.unwrap());
        assert_eq!(
            documents.get(Collection::Users, "u1").await.unwrap()["firstName"],
            "Ada"
        );
    }

    #[tokio::test]
    async fn second_upsert_replaces_the_first() {
        let (documents, store) = store();

        store.upsert_discussion(fixtures::discussion("d1")).await.unwrap();
        let mut renamed = fixtures::discussion("d1");
        renamed.title = "Renamed".to_string();
        store.upsert_discussion(renamed).await.unwrap();

        assert_eq!(documents.len(Collection::Discussions).await, 1);
        assert_eq!(
            documents.get(Collection::Discussions, "d1").await.unwrap()["title"],
            "Renamed"
        );
    }

    #[tokio::test]
    async fn backend_failure_is_not_absence() {
        let (documents, store) = store();
        documents.fail_with("connection refused");

        assert!(matches!(
            store.user_exists("u1").await,
            Err(ProjectionError::Storage(_))
        ));
    }
}
