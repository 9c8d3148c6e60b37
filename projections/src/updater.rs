//! Projection updaters: one inbound message in, at most one upsert out.
//!
//! # Pipeline
//!
//! ```text
//! bytes ─► envelope::decode ─► tag == expected? ─► JSON ─► ProjectionStore::upsert_*
//!               │                    │              │              │
//!               └────────────────────┴──────────────┴──────────────┴──► discard
//! ```
//!
//! Every failure ends in [`ProjectionUpdater::discard`]: the message is
//! logged, counted and dropped. Nothing is retried or dead-lettered.

use crate::consumer::MessageHandler;
use answers_core::envelope::{self, EnvelopeError};
use answers_core::event::{DomainEvent, EventError, EventTag};
use answers_core::projection::{ProjectionError, ProjectionStore};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Why a message was not applied.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The message is not a well-formed envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[from] EnvelopeError),

    /// The envelope is well-formed but carries another tag.
    #[error("Unexpected event type '{found}', expected '{expected}'")]
    UnexpectedTag {
        /// Tag this updater handles
        expected: EventTag,
        /// Tag found in the envelope
        found: String,
    },

    /// The payload does not deserialize into the expected entity.
    #[error("Invalid {tag} payload: {reason}")]
    InvalidPayload {
        /// Tag of the message
        tag: EventTag,
        /// Deserializer message
        reason: String,
    },

    /// The store rejected the upsert.
    #[error("Projection store error: {0}")]
    Storage(#[from] ProjectionError),
}

impl UpdateError {
    /// Metrics label for this failure.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope(_) => "malformed_envelope",
            Self::UnexpectedTag { .. } => "unexpected_tag",
            Self::InvalidPayload { .. } => "invalid_payload",
            Self::Storage(_) => "storage",
        }
    }
}

/// Outcome of a successfully applied message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    /// Tag of the applied event
    pub tag: EventTag,
    /// Id of the upserted entity
    pub id: String,
}

/// Applies one upstream event type to the projection store.
///
/// Build one per inbound topic with [`ProjectionUpdater::users`] or
/// [`ProjectionUpdater::discussions`].
#[derive(Clone)]
pub struct ProjectionUpdater {
    name: &'static str,
    expected: EventTag,
    store: Arc<dyn ProjectionStore>,
}

impl ProjectionUpdater {
    /// Updater for `userCreated` messages.
    #[must_use]
    pub fn users(store: Arc<dyn ProjectionStore>) -> Self {
        Self {
            name: "users",
            expected: EventTag::UserCreated,
            store,
        }
    }

    /// Updater for `discussionStarted` messages.
    #[must_use]
    pub fn discussions(store: Arc<dyn ProjectionStore>) -> Self {
        Self {
            name: "discussions",
            expected: EventTag::DiscussionStarted,
            store,
        }
    }

    /// Projection name, used in logs and metric labels.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The only tag this updater accepts.
    #[must_use]
    pub const fn expected_tag(&self) -> EventTag {
        self.expected
    }

    /// Decode `message` and upsert the entity it carries.
    ///
    /// # Errors
    ///
    /// Returns an [`UpdateError`] describing why the message was not
    /// applied. The store is untouched unless the error is
    /// [`UpdateError::Storage`].
    pub async fn apply(&self, message: &[u8]) -> Result<Applied, UpdateError> {
        let (tag, payload) = envelope::decode(message)?;

        if tag.parse::<EventTag>().ok() != Some(self.expected) {
            return Err(UpdateError::UnexpectedTag {
                expected: self.expected,
                found: tag.to_string(),
            });
        }

        let event = DomainEvent::from_payload(self.expected, payload).map_err(|e| match e {
            EventError::Payload { tag, reason } => UpdateError::InvalidPayload { tag, reason },
            other => UpdateError::InvalidPayload {
                tag: self.expected,
                reason: other.to_string(),
            },
        })?;
        let id = event.entity_id().to_string();

        match event {
            DomainEvent::UserCreated(user) => self.store.upsert_user(user).await?,
            DomainEvent::DiscussionStarted(discussion) => {
                self.store.upsert_discussion(discussion).await?;
            },
            DomainEvent::AnswerPosted(_) => {
                return Err(UpdateError::UnexpectedTag {
                    expected: self.expected,
                    found: EventTag::AnswerPosted.to_string(),
                });
            },
        }

        Ok(Applied {
            tag: self.expected,
            id,
        })
    }

    /// Apply `message`, discarding it on any failure.
    ///
    /// Returns what was applied, if anything. Never fails.
    pub async fn consume(&self, message: &[u8]) -> Option<Applied> {
        match self.apply(message).await {
            Ok(applied) => {
                metrics::counter!("projection.messages_applied", "projection" => self.name)
                    .increment(1);
                tracing::debug!(
                    projection = self.name,
                    tag = %applied.tag,
                    id = %applied.id,
                    "Projection updated"
                );
                Some(applied)
            },
            Err(error) => {
                self.discard(message, &error);
                None
            },
        }
    }

    /// The single discard policy: log, count, drop.
    fn discard(&self, message: &[u8], error: &UpdateError) {
        metrics::counter!(
            "projection.messages_discarded",
            "projection" => self.name,
            "reason" => error.reason()
        )
        .increment(1);

        match error {
            UpdateError::Storage(_) => tracing::error!(
                projection = self.name,
                reason = error.reason(),
                error = %error,
                "Projection update lost"
            ),
            _ => tracing::warn!(
                projection = self.name,
                reason = error.reason(),
                error = %error,
                bytes = message.len(),
                "Discarding message"
            ),
        }
    }
}

#[async_trait]
impl MessageHandler for ProjectionUpdater {
    async fn handle(&self, message: &[u8]) {
        self.consume(message).await;
    }
}
