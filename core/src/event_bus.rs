//! Event bus abstraction: the publisher and subscriber collaborators.
//!
//! The bus moves opaque byte messages between services. Framing and
//! interpretation belong to [`envelope`](crate::envelope) and
//! [`event`](crate::event); the bus never looks inside a message.
//!
//! # Architecture
//!
//! ```text
//!   users topic ─────┐                       ┌──── answers topic
//!                    │                       │
//!   discussions ──┐  │                       │
//!   topic         ▼  ▼                       │
//!           ┌─────────────┐           ┌──────┴──────┐
//!           │  subscribe  │           │   publish   │
//!           └──────┬──────┘           └──────▲──────┘
//!                  │                         │
//!                  ▼                         │
//!         Projection updaters        Command handler
//! ```
//!
//! # Key Principles
//!
//! - **At-least-once delivery**: Messages may be delivered multiple times
//! - **Idempotent consumers**: Projection upserts are last-write-wins
//! - **Ordered within partition**: Messages with the same key keep their order
//!
//! # Implementations
//!
//! - `InMemoryEventBus` in `answers-testing` - For tests (synchronous fan-out)
//! - `RedpandaEventBus` in `answers-redpanda` - For production (Kafka-compatible)

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish a message to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// A delivered record had no payload
    #[error("Empty message on topic '{0}'")]
    EmptyMessage(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Stream of raw messages from a subscription.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, EventBusError>> + Send>>;

/// Publish/subscribe transport.
///
/// # Dyn Compatibility
///
/// Methods return `Pin<Box<dyn Future>>` so the bus can be shared as
/// `Arc<dyn EventBus>` between the HTTP handlers and the consumers.
pub trait EventBus: Send + Sync {
    /// Publish a message to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the broker rejects or
    /// times out the message.
    fn publish(
        &self,
        topic: &str,
        message: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics and receive their messages.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if the subscription
    /// cannot be established.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream, EventBusError>> + Send + '_>>;
}
