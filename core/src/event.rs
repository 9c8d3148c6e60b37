//! Domain events carried on the bus.
//!
//! Raw type tags are only ever compared in one place: [`EventTag::from_str`].
//! Everything downstream of decoding matches on [`EventTag`] or
//! [`DomainEvent`], a closed set.
//!
//! # Example
//!
//! ```
//! use answers_core::event::{DomainEvent, EventTag};
//! use answers_core::types::User;
//! use chrono::Utc;
//!
//! let event = DomainEvent::UserCreated(User {
//!     id: "u1".to_string(),
//!     first_name: "Ada".to_string(),
//!     last_name: "Lovelace".to_string(),
//!     member_since: Utc::now(),
//! });
//!
//! let message = event.to_message().unwrap();
//! assert!(message.starts_with(b"11userCreated{"));
//!
//! let decoded = DomainEvent::from_message(&message).unwrap();
//! assert_eq!(decoded.tag(), EventTag::UserCreated);
//! ```

use crate::envelope::{self, EnvelopeError};
use crate::types::{Answer, Discussion, User};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// The message is not a well-formed envelope.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The envelope carries a tag this service does not know.
    #[error("Unknown event type: {0}")]
    UnknownTag(String),

    /// The payload does not deserialize into the tagged entity.
    #[error("Failed to deserialize {tag} payload: {reason}")]
    Payload {
        /// Tag of the offending envelope
        tag: EventTag,
        /// Deserializer message
        reason: String,
    },

    /// The entity could not be serialized.
    #[error("Failed to serialize event: {0}")]
    Serialization(String),
}

/// The closed set of event type tags this service reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventTag {
    /// A user registered upstream (inbound, users topic)
    UserCreated,
    /// A discussion was started upstream (inbound, discussions topic)
    DiscussionStarted,
    /// An answer was accepted here (outbound, answers topic)
    AnswerPosted,
}

impl EventTag {
    /// Every known tag.
    pub const ALL: [Self; 3] = [Self::UserCreated, Self::DiscussionStarted, Self::AnswerPosted];

    /// The tag as written in the envelope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserCreated => "userCreated",
            Self::DiscussionStarted => "discussionStarted",
            Self::AnswerPosted => "answerPosted",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventTag {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| EventError::UnknownTag(s.to_string()))
    }
}

/// A decoded event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    /// `userCreated`
    UserCreated(User),
    /// `discussionStarted`
    DiscussionStarted(Discussion),
    /// `answerPosted`
    AnswerPosted(Answer),
}

impl DomainEvent {
    /// The tag this event is framed with.
    #[must_use]
    pub const fn tag(&self) -> EventTag {
        match self {
            Self::UserCreated(_) => EventTag::UserCreated,
            Self::DiscussionStarted(_) => EventTag::DiscussionStarted,
            Self::AnswerPosted(_) => EventTag::AnswerPosted,
        }
    }

    /// Id of the entity the event is about.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            Self::UserCreated(user) => &user.id,
            Self::DiscussionStarted(discussion) => &discussion.id,
            Self::AnswerPosted(answer) => &answer.id,
        }
    }

    /// Serialize the entity as JSON and frame it with its tag.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if JSON serialization fails.
    pub fn to_message(&self) -> Result<Vec<u8>, EventError> {
        let payload = match self {
            Self::UserCreated(user) => serde_json::to_vec(user),
            Self::DiscussionStarted(discussion) => serde_json::to_vec(discussion),
            Self::AnswerPosted(answer) => serde_json::to_vec(answer),
        }
        .map_err(|e| EventError::Serialization(e.to_string()))?;

        Ok(envelope::encode(self.tag().as_str(), &payload)?)
    }

    /// Decode a wire message into a typed event.
    ///
    /// # Errors
    ///
    /// - [`EventError::Envelope`] if the framing is broken
    /// - [`EventError::UnknownTag`] if the tag is not one of [`EventTag::ALL`]
    /// - [`EventError::Payload`] if the JSON does not match the tagged entity
    pub fn from_message(message: &[u8]) -> Result<Self, EventError> {
        let (tag, payload) = envelope::decode(message)?;
        let tag: EventTag = tag.parse()?;
        Self::from_payload(tag, payload)
    }

    /// Deserialize a payload already known to carry `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Payload`] if the JSON does not match the entity.
    pub fn from_payload(tag: EventTag, payload: &[u8]) -> Result<Self, EventError> {
        let payload_error = |e: serde_json::Error| EventError::Payload {
            tag,
            reason: e.to_string(),
        };

        match tag {
            EventTag::UserCreated => serde_json::from_slice(payload)
                .map(Self::UserCreated)
                .map_err(payload_error),
            EventTag::DiscussionStarted => serde_json::from_slice(payload)
                .map(Self::DiscussionStarted)
                .map_err(payload_error),
            EventTag::AnswerPosted => serde_json::from_slice(payload)
                .map(Self::AnswerPosted)
                .map_err(payload_error),
        }
    }
}
