//! The "post an answer" command.
//!
//! # Flow
//!
//! ```text
//! body ──► parse ──► discussion exists? ──► author exists? ──► insert ──► encode ──► publish
//!            │               │                    │               │          │          │
//!            ▼               ▼                    ▼               ▼          ▼          ▼
//!           422             422/500              422/500         500        500        500
//! ```
//!
//! Every step is an early exit. Validation failures (422) happen before any
//! write. A publish failure happens after the answer was committed: the
//! answer stays persisted and no event is emitted for it.

use crate::environment::Clock;
use crate::event::DomainEvent;
use crate::event_bus::EventBus;
use crate::persistence::{Collection, DocumentStore};
use crate::projection::ProjectionStore;
use crate::types::{Answer, PostAnswer};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Why a command was rejected as invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The body is not a JSON answer
    InvalidBody,
    /// No projected discussion has the referenced id
    UnknownDiscussion,
    /// No projected user has the referenced author id
    UnknownAuthor,
}

impl Rejection {
    /// User-facing reason.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidBody => "body not valid JSON",
            Self::UnknownDiscussion => "discussion does not exist",
            Self::UnknownAuthor => "author does not exist",
        }
    }

    /// Short machine label, used for metrics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InvalidBody => "invalid_body",
            Self::UnknownDiscussion => "unknown_discussion",
            Self::UnknownAuthor => "unknown_author",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The step at which an infrastructure dependency failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Checking the discussion projection
    DiscussionLookup,
    /// Checking the user projection
    AuthorLookup,
    /// Inserting the answer
    Persist,
    /// Serializing the outbound event
    Encode,
    /// Sending the outbound event
    Publish,
}

impl Stage {
    /// Generic message returned to the caller.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::DiscussionLookup => "cannot verify discussion",
            Self::AuthorLookup => "cannot verify author",
            Self::Persist => "cannot save answer",
            Self::Encode => "cannot process the request",
            Self::Publish => "failed to send message",
        }
    }
}

/// Errors returned by [`AnswerCommandHandler::post_answer`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Client-caused; never retried, the message is shown to the caller.
    #[error("{0}")]
    Validation(Rejection),

    /// Infrastructure failure; `detail` is for logs only.
    #[error("{}: {detail}", stage.message())]
    Dependency {
        /// Failing step
        stage: Stage,
        /// Underlying error
        detail: String,
    },
}

impl CommandError {
    fn dependency(stage: Stage, detail: impl fmt::Display) -> Self {
        Self::Dependency {
            stage,
            detail: detail.to_string(),
        }
    }

    /// Message safe to return to the caller.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(rejection) => rejection.message(),
            Self::Dependency { stage, .. } => stage.message(),
        }
    }
}

/// Validates, persists and announces posted answers.
///
/// # Example
///
/// ```ignore
/// let handler = AnswerCommandHandler::new(projections, documents, event_bus, clock, "answers");
///
/// match handler.post_answer(&body).await {
///     Ok(answer) => tracing::info!(answer_id = %answer.id, "Answer posted"),
///     Err(CommandError::Validation(reason)) => { /* 422 */ }
///     Err(CommandError::Dependency { .. }) => { /* 500 */ }
/// }
/// ```
#[derive(Clone)]
pub struct AnswerCommandHandler {
    projections: Arc<dyn ProjectionStore>,
    documents: Arc<dyn DocumentStore>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    topic: String,
}

impl AnswerCommandHandler {
    /// Create a handler publishing to `topic`.
    #[must_use]
    pub fn new(
        projections: Arc<dyn ProjectionStore>,
        documents: Arc<dyn DocumentStore>,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            projections,
            documents,
            event_bus,
            clock,
            topic: topic.into(),
        }
    }

    /// Outbound topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Handle a raw "post an answer" request body.
    ///
    /// Returns the answer as persisted and published.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Validation`] for an unparseable body, an unknown
    ///   discussion or an unknown author; nothing is written
    /// - [`CommandError::Dependency`] if a projection lookup, the insert,
    ///   encoding or the publish fails
    pub async fn post_answer(&self, body: &[u8]) -> Result<Answer, CommandError> {
        let command: PostAnswer = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "Rejected answer body");
            CommandError::Validation(Rejection::InvalidBody)
        })?;
        let answer = self.complete(command);

        let discussion_exists = self
            .projections
            .discussion_exists(&answer.discussion)
            .await
            .map_err(|e| CommandError::dependency(Stage::DiscussionLookup, e))?;
        if !discussion_exists {
            return Err(CommandError::Validation(Rejection::UnknownDiscussion));
        }

        let author_exists = self
            .projections
            .user_exists(&answer.author)
            .await
            .map_err(|e| CommandError::dependency(Stage::AuthorLookup, e))?;
        if !author_exists {
            return Err(CommandError::Validation(Rejection::UnknownAuthor));
        }

        let document = serde_json::to_value(&answer)
            .map_err(|e| CommandError::dependency(Stage::Persist, e))?;
        self.documents
            .insert(Collection::Answers, &answer.id, document)
            .await
            .map_err(|e| {
                tracing::error!(
                    answer_id = %answer.id,
                    collection = %Collection::Answers,
                    error = %e,
                    "Cannot create answer document"
                );
                CommandError::dependency(Stage::Persist, e)
            })?;

        let message = DomainEvent::AnswerPosted(answer.clone())
            .to_message()
            .map_err(|e| {
                tracing::error!(answer_id = %answer.id, error = %e, "Cannot encode answerPosted event");
                CommandError::dependency(Stage::Encode, e)
            })?;

        self.event_bus
            .publish(&self.topic, &message)
            .await
            .map_err(|e| {
                // The answer is already committed at this point.
                tracing::error!(
                    answer_id = %answer.id,
                    topic = %self.topic,
                    error = %e,
                    "Answer persisted but answerPosted was not published"
                );
                CommandError::dependency(Stage::Publish, e)
            })?;

        tracing::info!(
            answer_id = %answer.id,
            discussion = %answer.discussion,
            author = %answer.author,
            "Answer posted"
        );
        Ok(answer)
    }

    fn complete(&self, command: PostAnswer) -> Answer {
        let id = command
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Answer {
            id,
            content: command.content,
            author: command.author,
            created_at: command.created_at.unwrap_or_else(|| self.clock.now()),
            discussion: command.discussion,
        }
    }
}
