//! # Answers Testing
//!
//! Testing utilities for the answers service.
//!
//! This crate provides:
//! - In-memory implementations of the collaborator traits
//!   ([`InMemoryProjectionStore`], [`InMemoryDocumentStore`], [`InMemoryEventBus`])
//! - A deterministic [`FixedClock`]
//! - Entity [`fixtures`] and a pre-wired [`CommandHarness`]
//!
//! ## Example
//!
//! ```ignore
//! use answers_testing::{CommandHarness, fixtures};
//!
//! #[tokio::test]
//! async fn posts_an_answer() {
//!     let harness = CommandHarness::new();
//!     harness.seed_user("u1").await;
//!     harness.seed_discussion("d1").await;
//!
//!     let answer = harness
//!         .handler
//!         .post_answer(&fixtures::answer_body("u1", "d1"))
//!         .await
//!         .unwrap();
//!     assert_eq!(harness.event_bus.published_to("answers").len(), 1);
//! }
//! ```

use answers_core::environment::Clock;
use chrono::{DateTime, Utc};

pub mod document_mocks;
pub mod event_bus_mocks;
pub mod projection_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use answers_testing::mocks::FixedClock;
    /// use answers_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Entity builders with stable, readable defaults.
pub mod fixtures {
    #![allow(clippy::expect_used)]

    use answers_core::envelope;
    use answers_core::types::{Discussion, User};
    use chrono::{DateTime, TimeZone, Utc};

    /// 2016-03-01T12:00:00Z.
    ///
    /// # Panics
    ///
    /// Never; the timestamp is hardcoded and valid.
    #[must_use]
    pub fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 3, 1, 12, 0, 0)
            .single()
            .expect("hardcoded timestamp is valid")
    }

    /// Ada Lovelace, with the given id.
    #[must_use]
    pub fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            member_since: timestamp(),
        }
    }

    /// A discussion started by `u1`, with the given id.
    #[must_use]
    pub fn discussion(id: &str) -> Discussion {
        Discussion {
            id: id.to_string(),
            title: "Analytical engines".to_string(),
            description: "Can they compose music?".to_string(),
            initiator: "u1".to_string(),
            created_at: timestamp(),
        }
    }

    /// JSON body for a "post an answer" request without id or timestamp.
    #[must_use]
    pub fn answer_body(author: &str, discussion: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "content": "hi",
            "author": author,
            "discussion": discussion,
        }))
        .expect("json! values always serialize")
    }

    /// An envelope with `tag` around the JSON serialization of `payload`.
    ///
    /// # Panics
    ///
    /// Panics if the tag is longer than 99 bytes.
    #[must_use]
    pub fn message<T: serde::Serialize>(tag: &str, payload: &T) -> Vec<u8> {
        let payload = serde_json::to_vec(payload).expect("fixture serializes");
        envelope::encode(tag, &payload).expect("fixture tag fits the prefix")
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use answers_core::types::User;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    /// Non-empty entity ids.
    pub fn id() -> impl Strategy<Value = String> {
        "[a-z0-9-]{1,24}"
    }

    /// Users with arbitrary names and a registration date in 2000..2030.
    pub fn user() -> impl Strategy<Value = User> {
        (id(), "[A-Za-z ]{0,16}", "[A-Za-z ]{0,16}", 946_684_800_i64..1_893_456_000_i64).prop_map(
            |(id, first_name, last_name, seconds)| User {
                id,
                first_name,
                last_name,
                member_since: Utc.timestamp_opt(seconds, 0).single().unwrap_or_default(),
            },
        )
    }
}

/// Test helpers
pub mod helpers {
    use crate::mocks::test_clock;
    use crate::{InMemoryDocumentStore, InMemoryEventBus, InMemoryProjectionStore, fixtures};
    use answers_core::command::AnswerCommandHandler;
    use answers_core::projection::ProjectionStore;
    use std::sync::Arc;

    /// Outbound topic used by [`CommandHarness`].
    pub const ANSWERS_TOPIC: &str = "answers";

    /// An [`AnswerCommandHandler`] wired to in-memory collaborators, with
    /// handles on each of them for seeding and assertions.
    #[derive(Clone)]
    pub struct CommandHarness {
        /// Handler under test
        pub handler: Arc<AnswerCommandHandler>,
        /// Projections consulted during validation
        pub projections: InMemoryProjectionStore,
        /// Where answers are inserted
        pub documents: InMemoryDocumentStore,
        /// Where `answerPosted` is published
        pub event_bus: InMemoryEventBus,
    }

    impl CommandHarness {
        /// Fresh collaborators and a handler using [`test_clock`].
        #[must_use]
        pub fn new() -> Self {
            let projections = InMemoryProjectionStore::new();
            let documents = InMemoryDocumentStore::new();
            let event_bus = InMemoryEventBus::new();

            let handler = AnswerCommandHandler::new(
                Arc::new(projections.clone()),
                Arc::new(documents.clone()),
                Arc::new(event_bus.clone()),
                Arc::new(test_clock()),
                ANSWERS_TOPIC,
            );

            Self {
                handler: Arc::new(handler),
                projections,
                documents,
                event_bus,
            }
        }

        /// Project a user with this id.
        ///
        /// # Panics
        ///
        /// Panics if a failure is being injected into the projection store.
        #[allow(clippy::expect_used)]
        pub async fn seed_user(&self, id: &str) {
            self.projections
                .upsert_user(fixtures::user(id))
                .await
                .expect("seed user");
        }

        /// Project a discussion with this id.
        ///
        /// # Panics
        ///
        /// Panics if a failure is being injected into the projection store.
        #[allow(clippy::expect_used)]
        pub async fn seed_discussion(&self, id: &str) {
            self.projections
                .upsert_discussion(fixtures::discussion(id))
                .await
                .expect("seed discussion");
        }
    }

    impl Default for CommandHarness {
        fn default() -> Self {
            Self::new()
        }
    }
}

// Re-export commonly used items
pub use document_mocks::InMemoryDocumentStore;
pub use event_bus_mocks::{InMemoryEventBus, PublishedMessage};
pub use helpers::CommandHarness;
pub use mocks::{FixedClock, test_clock};
pub use projection_mocks::InMemoryProjectionStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn message_fixture_is_an_envelope() {
        let message = fixtures::message("userCreated", &fixtures::user("u1"));
        assert!(message.starts_with(b"11userCreated{"));
    }
}
