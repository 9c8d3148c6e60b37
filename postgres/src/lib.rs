//! `PostgreSQL` document store for the answers service.
//!
//! Implements the [`DocumentStore`](answers_core::persistence::DocumentStore)
//! trait from `answers-core` on top of sqlx. Each collection is a table of
//! JSONB documents keyed by id:
//!
//! ```sql
//! CREATE TABLE answers (
//!     id TEXT PRIMARY KEY,
//!     document JSONB NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! Tables are created by the embedded migrations, see
//! [`PostgresDocumentStore::migrate`].
//!
//! # Example
//!
//! ```ignore
//! use answers_postgres::PostgresDocumentStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresDocumentStore::connect("postgres://localhost/answers", 10).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod document_store;

pub use document_store::PostgresDocumentStore;
