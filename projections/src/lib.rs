//! User and discussion projections for the answers service.
//!
//! # Overview
//!
//! - [`DocumentProjectionStore`]: the production
//!   [`ProjectionStore`](answers_core::projection::ProjectionStore), backed by
//!   the `users` and `discussions` collections of a document store
//! - [`ProjectionUpdater`]: turns one inbound message into one upsert, or
//!   discards it
//! - [`EventConsumer`]: subscribe-process-reconnect loop feeding a
//!   [`MessageHandler`]
//!
//! # Wiring
//!
//! ```ignore
//! use answers_projections::{DocumentProjectionStore, EventConsumer, ProjectionUpdater};
//!
//! let store = Arc::new(DocumentProjectionStore::new(documents));
//!
//! let users = EventConsumer::builder()
//!     .name("users-projection")
//!     .topics(vec!["users".to_string()])
//!     .event_bus(event_bus.clone())
//!     .handler(Arc::new(ProjectionUpdater::users(store.clone())))
//!     .shutdown(shutdown_tx.subscribe())
//!     .build()?;
//!
//! let handle = users.spawn();
//! ```

pub mod consumer;
pub mod store;
pub mod updater;

pub use consumer::{ConsumerBuildError, EventConsumer, EventConsumerBuilder, MessageHandler};
pub use store::DocumentProjectionStore;
pub use updater::{Applied, ProjectionUpdater, UpdateError};
