//! Descriptions of the counters recorded across the service.
//!
//! ## Counters
//! - `answers.posted` - Answers accepted, persisted and published
//! - `answers.rejected{reason}` - Requests failing validation
//! - `answers.publish_failed` - Answers persisted without an `answerPosted` event
//! - `projection.messages_applied{projection}` - Inbound events written to a projection
//! - `projection.messages_discarded{projection, reason}` - Inbound events dropped
//! - `documents.inserted{collection}` - Documents inserted into the store

use metrics::describe_counter;

/// Register all metric descriptions. Call once, after the recorder is
/// installed.
pub fn register_metrics() {
    describe_counter!("answers.posted", "Answers accepted, persisted and published");
    describe_counter!(
        "answers.rejected",
        "Answer requests rejected by validation, by reason"
    );
    describe_counter!(
        "answers.publish_failed",
        "Answers persisted whose answerPosted event could not be published"
    );
    describe_counter!(
        "projection.messages_applied",
        "Inbound events applied to a projection"
    );
    describe_counter!(
        "projection.messages_discarded",
        "Inbound events discarded by a projection, by reason"
    );
    describe_counter!("documents.inserted", "Documents inserted, by collection");
}
