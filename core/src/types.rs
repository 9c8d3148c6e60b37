//! Domain types.
//!
//! `User` and `Discussion` are snapshots of aggregates owned by other
//! services; this service only ever sees them through their events. `Answer`
//! is the aggregate this service owns.
//!
//! All three serialize with the camelCase field names used on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user, as announced on the users topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier
    pub id: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// When the user registered
    pub member_since: DateTime<Utc>,
}

/// A started discussion, as announced on the discussions topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    /// Discussion identifier
    pub id: String,
    /// Discussion title
    pub title: String,
    /// Opening description
    pub description: String,
    /// Id of the user who started the discussion
    pub initiator: String,
    /// When the discussion was started
    pub created_at: DateTime<Utc>,
}

/// An answer posted to a discussion.
///
/// Never mutated once persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Answer identifier
    pub id: String,
    /// Answer body
    pub content: String,
    /// Id of the answering [`User`]
    pub author: String,
    /// When the answer was written
    pub created_at: DateTime<Utc>,
    /// Id of the answered [`Discussion`]
    pub discussion: String,
}

/// Body of a "post an answer" command before the server fills in defaults.
///
/// `id` and `createdAt` may be supplied by the caller; when absent the
/// command handler assigns a fresh id and the current time.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAnswer {
    /// Caller-chosen id, if any
    #[serde(default)]
    pub id: Option<String>,
    /// Answer body
    pub content: String,
    /// Id of the answering user
    pub author: String,
    /// Caller-supplied creation time, if any
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Id of the answered discussion
    pub discussion: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn user_uses_camel_case_fields() {
        let json = r#"{
            "id": "u1",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "memberSince": "2015-12-10T08:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.first_name, "Ada");

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("memberSince").is_some());
        assert!(value.get("member_since").is_none());
    }

    #[test]
    fn discussion_accepts_offset_timestamps() {
        let json = r#"{
            "id": "d1",
            "title": "Ownership",
            "description": "Who owns what?",
            "initiator": "u1",
            "createdAt": "2016-01-02T10:00:00+01:00"
        }"#;
        let discussion: Discussion = serde_json::from_str(json).unwrap();
        assert_eq!(discussion.created_at.to_rfc3339(), "2016-01-02T09:00:00+00:00");
    }

    #[test]
    fn post_answer_id_and_created_at_are_optional() {
        let json = r#"{"content": "hi", "author": "u1", "discussion": "d1"}"#;
        let command: PostAnswer = serde_json::from_str(json).unwrap();
        assert_eq!(command.id, None);
        assert_eq!(command.created_at, None);
    }

    #[test]
    fn post_answer_requires_content() {
        let json = r#"{"author": "u1", "discussion": "d1"}"#;
        assert!(serde_json::from_str::<PostAnswer>(json).is_err());
    }
}
