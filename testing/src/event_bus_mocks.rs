//! In-memory event bus.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use answers_core::event_bus::{EventBus, EventBusError, MessageStream};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A message recorded by [`InMemoryEventBus::publish`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Destination topic
    pub topic: String,
    /// Raw message bytes
    pub message: Vec<u8>,
}

#[derive(Debug, Default)]
struct BusState {
    published: Vec<PublishedMessage>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<Result<Vec<u8>, EventBusError>>>>,
    publish_failure: Option<String>,
    subscribe_failures: usize,
    subscriptions: usize,
}

/// Event bus that delivers synchronously to in-process subscribers and
/// records everything published.
///
/// # Example
///
/// ```
/// use answers_testing::InMemoryEventBus;
/// use answers_core::event_bus::EventBus;
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryEventBus::new();
/// let mut stream = bus.subscribe(&["users"]).await?;
///
/// bus.publish("users", b"11userCreated{}").await?;
/// assert_eq!(stream.next().await.unwrap()?, b"11userCreated{}".to_vec());
/// assert_eq!(bus.published_to("users").len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventBus {
    state: Arc<Mutex<BusState>>,
}

impl InMemoryEventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().unwrap().published.clone()
    }

    /// Messages published to `topic`, in order.
    #[must_use]
    pub fn published_to(&self, topic: &str) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|published| published.topic == topic)
            .map(|published| published.message.clone())
            .collect()
    }

    /// Make every following publish fail with `reason`.
    pub fn fail_publish_with(&self, reason: impl Into<String>) {
        self.state.lock().unwrap().publish_failure = Some(reason.into());
    }

    /// Make the next `count` subscribe calls fail.
    pub fn fail_next_subscriptions(&self, count: usize) {
        self.state.lock().unwrap().subscribe_failures = count;
    }

    /// Successful subscribe calls so far.
    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.state.lock().unwrap().subscriptions
    }

    /// Deliver a transport error to every subscriber of `topic`.
    pub fn inject_transport_error(&self, topic: &str, reason: impl Into<String>) {
        let reason = reason.into();
        let mut state = self.state.lock().unwrap();
        if let Some(senders) = state.subscribers.get_mut(topic) {
            senders.retain(|sender| {
                sender
                    .send(Err(EventBusError::TransportError(reason.clone())))
                    .is_ok()
            });
        }
    }

    /// End every open subscription stream.
    pub fn close_subscriptions(&self) {
        self.state.lock().unwrap().subscribers.clear();
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        message: &[u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let message = message.to_vec();

        Box::pin(async move {
            let mut state = self.state.lock().unwrap();

            if let Some(reason) = state.publish_failure.clone() {
                return Err(EventBusError::PublishFailed { topic, reason });
            }

            if let Some(senders) = state.subscribers.get_mut(&topic) {
                senders.retain(|sender| sender.send(Ok(message.clone())).is_ok());
            }
            state.published.push(PublishedMessage { topic, message });
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();

        Box::pin(async move {
            let mut state = self.state.lock().unwrap();

            if state.subscribe_failures > 0 {
                state.subscribe_failures -= 1;
                return Err(EventBusError::SubscriptionFailed {
                    topics,
                    reason: "injected failure".to_string(),
                });
            }

            let (tx, rx) = mpsc::unbounded_channel();
            for topic in topics {
                state.subscribers.entry(topic).or_default().push(tx.clone());
            }
            state.subscriptions += 1;

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(item) = rx.recv().await {
                    yield item;
                }
            };
            Ok(Box::pin(stream) as MessageStream)
        })
    }
}
