//! # Answers Core
//!
//! Domain types, wire format and collaborator traits for the answers command
//! service.
//!
//! The service accepts "post an answer" commands, checks them against local
//! projections of users and discussions (fed by upstream event streams),
//! stores accepted answers and announces them as `answerPosted` events.
//!
//! ## Modules
//!
//! - [`envelope`]: `<2-digit tag length><tag><payload>` message framing
//! - [`event`]: closed set of event tags and decoded domain events
//! - [`types`]: users, discussions, answers and the inbound command
//! - [`projection`]: the [`ProjectionStore`](projection::ProjectionStore) seam
//! - [`persistence`]: the [`DocumentStore`](persistence::DocumentStore) seam
//! - [`event_bus`]: the [`EventBus`](event_bus::EventBus) seam
//! - [`command`]: the [`AnswerCommandHandler`](command::AnswerCommandHandler)
//!
//! ## Architecture Principles
//!
//! - Infrastructure lives behind dyn-compatible traits, injected as `Arc<dyn _>`
//! - Raw tags are parsed once, at the decoding boundary
//! - Validation happens before any write
//!
//! ## Example
//!
//! ```ignore
//! use answers_core::command::AnswerCommandHandler;
//! use answers_core::environment::SystemClock;
//!
//! let handler = AnswerCommandHandler::new(
//!     projections,
//!     documents,
//!     event_bus,
//!     Arc::new(SystemClock),
//!     "answers",
//! );
//!
//! let answer = handler.post_answer(br#"{"content":"hi","author":"u1","discussion":"d1"}"#).await?;
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod command;
pub mod envelope;
pub mod event;
pub mod event_bus;
pub mod persistence;
pub mod projection;
pub mod types;

/// Environment module - Dependency injection traits
///
/// External effects the command handler needs beyond storage and transport.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
