//! Event bus consumer with automatic reconnection.
//!
//! `EventConsumer` owns the subscribe-process-reconnect loop for one set of
//! topics. What to do with each message is up to its [`MessageHandler`].
//!
//! ```text
//! loop {
//!     subscribe:
//!         loop {
//!             next message ─► handler.handle(bytes)
//!             transport error ─► log, continue
//!             shutdown ─► return
//!         }
//!         stream ended / subscribe failed ─► sleep(retry_delay)
//! }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let consumer = EventConsumer::builder()
//!     .name("users-projection")
//!     .topics(vec!["users".to_string()])
//!     .event_bus(event_bus)
//!     .handler(Arc::new(ProjectionUpdater::users(store)))
//!     .shutdown(shutdown_rx)
//!     .build()?;
//!
//! let handle = consumer.spawn();
//! ```

use answers_core::event_bus::{EventBus, MessageStream};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Instrument};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Processes one raw message.
///
/// Handlers own their failure policy: the consumer never sees an error and
/// always moves on to the next message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one message as delivered by the bus.
    async fn handle(&self, message: &[u8]);
}

/// Missing field when building an [`EventConsumer`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("EventConsumer requires `{0}`")]
pub struct ConsumerBuildError(pub &'static str);

/// Generic event bus consumer.
///
/// # Lifecycle
///
/// 1. Created via `builder()`
/// 2. Spawned as background task via `spawn()`
/// 3. Runs until the shutdown signal fires
pub struct EventConsumer {
    /// Consumer name (for logging)
    name: String,
    /// Topics to subscribe to
    topics: Vec<String>,
    /// Event bus to consume from
    event_bus: Arc<dyn EventBus>,
    /// Handler for every message
    handler: Arc<dyn MessageHandler>,
    /// Shutdown signal receiver
    shutdown: broadcast::Receiver<()>,
    /// Delay before re-subscribing
    retry_delay: Duration,
}

enum StreamOutcome {
    Ended,
    Shutdown,
}

impl EventConsumer {
    /// Create a builder for configuring a consumer.
    #[must_use]
    pub fn builder() -> EventConsumerBuilder {
        EventConsumerBuilder::default()
    }

    /// Consumer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn the consumer as a background task.
    ///
    /// The returned handle completes once shutdown has been observed.
    #[must_use]
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the loop on the current task until shutdown.
    pub async fn run(&mut self) {
        info!(consumer = %self.name, topics = ?self.topics, "Event consumer started");

        loop {
            let topics: Vec<&str> = self.topics.iter().map(String::as_str).collect();

            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(consumer = %self.name, "Event consumer received shutdown signal");
                    break;
                }
                subscribe_result = self.event_bus.subscribe(&topics) => {
                    match subscribe_result {
                        Ok(mut stream) => {
                            info!(consumer = %self.name, topics = ?self.topics, "Subscribed to event bus");

                            if matches!(self.process_stream(&mut stream).await, StreamOutcome::Shutdown) {
                                break;
                            }

                            warn!(
                                consumer = %self.name,
                                retry_delay = ?self.retry_delay,
                                "Message stream ended, reconnecting"
                            );
                        }
                        Err(e) => {
                            error!(
                                consumer = %self.name,
                                error = %e,
                                retry_delay = ?self.retry_delay,
                                "Failed to subscribe to event bus"
                            );
                        }
                    }
                }
            }

            if self.wait_before_retry().await {
                break;
            }
        }

        info!(consumer = %self.name, "Event consumer stopped");
    }

    /// Sleep for the retry delay; `true` if shutdown arrived meanwhile.
    async fn wait_before_retry(&mut self) -> bool {
        tokio::select! {
            _ = self.shutdown.recv() => {
                info!(consumer = %self.name, "Event consumer received shutdown signal while waiting to reconnect");
                true
            }
            () = tokio::time::sleep(self.retry_delay) => false,
        }
    }

    async fn process_stream(&mut self, stream: &mut MessageStream) -> StreamOutcome {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(consumer = %self.name, "Event consumer received shutdown signal during processing");
                    return StreamOutcome::Shutdown;
                }
                next = stream.next() => {
                    match next {
                        Some(Ok(message)) => {
                            let span = tracing::debug_span!(
                                "consume",
                                consumer = %self.name,
                                topics = ?self.topics,
                            );
                            self.handler.handle(&message).instrument(span).await;
                        }
                        Some(Err(e)) => {
                            error!(
                                consumer = %self.name,
                                error = %e,
                                "Error receiving message from stream"
                            );
                        }
                        None => return StreamOutcome::Ended,
                    }
                }
            }
        }
    }
}

/// Builder for configuring an [`EventConsumer`].
#[derive(Default)]
pub struct EventConsumerBuilder {
    name: Option<String>,
    topics: Option<Vec<String>>,
    event_bus: Option<Arc<dyn EventBus>>,
    handler: Option<Arc<dyn MessageHandler>>,
    shutdown: Option<broadcast::Receiver<()>>,
    retry_delay: Option<Duration>,
}

impl EventConsumerBuilder {
    /// Set consumer name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set topics to subscribe to.
    #[must_use]
    pub fn topics(mut self, topics: Vec<String>) -> Self {
        self.topics = Some(topics);
        self
    }

    /// Set event bus instance.
    #[must_use]
    pub fn event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Set message handler.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Set shutdown signal receiver.
    #[must_use]
    pub fn shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Set custom retry delay (default: 5 seconds).
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Build the `EventConsumer`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerBuildError`] naming the first missing field among
    /// `name`, `topics`, `event_bus`, `handler` and `shutdown`.
    pub fn build(self) -> Result<EventConsumer, ConsumerBuildError> {
        Ok(EventConsumer {
            name: self.name.ok_or(ConsumerBuildError("name"))?,
            topics: self.topics.ok_or(ConsumerBuildError("topics"))?,
            event_bus: self.event_bus.ok_or(ConsumerBuildError("event_bus"))?,
            handler: self.handler.ok_or(ConsumerBuildError("handler"))?,
            shutdown: self.shutdown.ok_or(ConsumerBuildError("shutdown"))?,
            retry_delay: self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
        })
    }
}
