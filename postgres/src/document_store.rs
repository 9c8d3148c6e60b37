use answers_core::persistence::{
    Collection, DocumentStore, PersistenceError, PersistenceFuture,
};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// PostgreSQL-backed [`DocumentStore`].
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Create a store using an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with a pool of at most `max_connections`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Database`] if the connection fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| PersistenceError::Database(format!("Failed to connect: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Create the collection tables if they don't exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PersistenceError::Database(format!("Migration failed: {e}")))?;

        tracing::info!("Document store migrations applied");
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

impl DocumentStore for PostgresDocumentStore {
    fn insert<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        document: serde_json::Value,
    ) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            // Table names come from the closed Collection enum.
            let query = format!(
                "INSERT INTO {} (id, document, updated_at) VALUES ($1, $2, now())",
                collection.name()
            );

            sqlx::query(&query)
                .bind(id)
                .bind(document)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        PersistenceError::Duplicate {
                            collection,
                            id: id.to_string(),
                        }
                    } else {
                        PersistenceError::Database(format!("Failed to insert: {e}"))
                    }
                })?;

            metrics::counter!("documents.inserted", "collection" => collection.name())
                .increment(1);
            tracing::debug!(collection = %collection, id, "Document inserted");
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
            let query = format!(
                "INSERT INTO {} (id, document, updated_at)
                 VALUES ($1, $2, now())
                 ON CONFLICT (id) DO UPDATE
                 SET document = EXCLUDED.document, updated_at = now()",
                collection.name()
            );

            sqlx::query(&query)
                .bind(id)
                .bind(document)
                .execute(&self.pool)
                .await
                .map_err(|e| PersistenceError::Database(format!("Failed to upsert: {e}")))?;

            tracing::debug!(collection = %collection, id, "Document upserted");
            Ok(())
        })
    }

    fn count_by_id<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> PersistenceFuture<'a, u64> {
        Box::pin(async move {
            let query = format!("SELECT COUNT(*) FROM {} WHERE id = $1", collection.name());

            let (count,): (i64,) = sqlx::query_as(&query)
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PersistenceError::Database(format!("Failed to count: {e}")))?;

            Ok(u64::try_from(count).unwrap_or(0))
        })
    }
}
