//! Document persistence: the write-side storage collaborator.
//!
//! Storage is modelled as a set of named collections of JSON documents keyed
//! by id. The answers collection is the write model of this service; the
//! users and discussions collections back the document-based projection
//! store.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Logical collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Projected users
    Users,
    /// Projected discussions
    Discussions,
    /// Answers accepted by this service
    Answers,
}

impl Collection {
    /// Every collection.
    pub const ALL: [Self; 3] = [Self::Users, Self::Discussions, Self::Answers];

    /// Collection name, also used as the table name by SQL backends.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Discussions => "discussions",
            Self::Answers => "answers",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors returned by a [`DocumentStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// `insert` found an existing document with the same id.
    #[error("Document '{id}' already exists in {collection}")]
    Duplicate {
        /// Target collection
        collection: Collection,
        /// Conflicting id
        id: String,
    },

    /// The backend failed.
    #[error("Database error: {0}")]
    Database(String),
}

/// Boxed future returned by [`DocumentStore`] methods.
pub type PersistenceFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, PersistenceError>> + Send + 'a>>;

/// Id-keyed JSON document storage.
pub trait DocumentStore: Send + Sync {
    /// Insert a new document.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Duplicate`] if `id` already exists in `collection`
    /// - [`PersistenceError::Database`] on backend failure
    fn insert<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        document: serde_json::Value,
    ) -> PersistenceFuture<'a, ()>;

    /// Insert a document, replacing any existing one with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Database`] on backend failure.
    fn upsert<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        document: serde_json::Value,
    ) -> PersistenceFuture<'a, ()>;

    /// Number of documents with this id (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Database`] on backend failure.
    fn count_by_id<'a>(&'a self, collection: Collection, id: &'a str)
    -> PersistenceFuture<'a, u64>;
}
