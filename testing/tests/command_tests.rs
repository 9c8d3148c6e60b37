//! Posting answers against in-memory collaborators.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use answers_core::command::{CommandError, Rejection, Stage};
use answers_core::environment::Clock;
use answers_core::event::{DomainEvent, EventTag};
use answers_core::persistence::Collection;
use answers_core::types::Answer;
use answers_testing::helpers::ANSWERS_TOPIC;
use answers_testing::{CommandHarness, fixtures, test_clock};
use serde_json::json;

async fn seeded() -> CommandHarness {
    let harness = CommandHarness::new();
    harness.seed_user("u1").await;
    harness.seed_discussion("d1").await;
    harness
}

fn body(value: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

#[tokio::test]
async fn valid_answer_is_persisted_and_published() {
    let harness = seeded().await;
    let created_at = fixtures::timestamp();

    let answer = harness
        .handler
        .post_answer(&body(&json!({
            "id": "a1",
            "content": "hi",
            "author": "u1",
            "discussion": "d1",
            "createdAt": created_at,
        })))
        .await
        .expect("answer should be accepted");

    let expected = Answer {
        id: "a1".to_string(),
        content: "hi".to_string(),
        author: "u1".to_string(),
        created_at,
        discussion: "d1".to_string(),
    };
    assert_eq!(answer, expected);

    let stored = harness
        .documents
        .get(Collection::Answers, "a1")
        .await
        .expect("answer document");
    assert_eq!(serde_json::from_value::<Answer>(stored).unwrap(), expected);

    let published = harness.event_bus.published_to(ANSWERS_TOPIC);
    assert_eq!(published.len(), 1);
    assert!(published[0].starts_with(b"12answerPosted"));
    assert_eq!(
        DomainEvent::from_message(&published[0]).unwrap(),
        DomainEvent::AnswerPosted(expected)
    );
}

#[tokio::test]
async fn missing_id_and_timestamp_are_filled_in() {
    let harness = seeded().await;

    let answer = harness
        .handler
        .post_answer(&fixtures::answer_body("u1", "d1"))
        .await
        .unwrap();

    assert!(uuid::Uuid::parse_str(&answer.id).is_ok());
    assert_eq!(answer.created_at, test_clock().now());
    assert_eq!(harness.documents.len(Collection::Answers).await, 1);
}

#[tokio::test]
async fn empty_id_is_replaced() {
    let harness = seeded().await;

    let answer = harness
        .handler
        .post_answer(&body(&json!({
            "id": "",
            "content": "hi",
            "author": "u1",
            "discussion": "d1",
        })))
        .await
        .unwrap();

    assert!(!answer.id.is_empty());
}

#[tokio::test]
async fn malformed_json_touches_nothing() {
    let harness = seeded().await;
    let lookups_before = harness.projections.lookups();

    let result = harness.handler.post_answer(b"{not json").await;

    assert_eq!(result, Err(CommandError::Validation(Rejection::InvalidBody)));
    assert_eq!(harness.projections.lookups(), lookups_before);
    assert_eq!(harness.documents.writes(), 0);
    assert!(harness.event_bus.published().is_empty());
}

#[tokio::test]
async fn missing_required_field_is_invalid_body() {
    let harness = seeded().await;

    let result = harness
        .handler
        .post_answer(&body(&json!({"content": "hi", "author": "u1"})))
        .await;

    assert_eq!(result, Err(CommandError::Validation(Rejection::InvalidBody)));
}

#[tokio::test]
async fn unknown_discussion_is_rejected_without_side_effects() {
    let harness = seeded().await;

    let result = harness
        .handler
        .post_answer(&fixtures::answer_body("u1", "missing"))
        .await;

    let error = result.unwrap_err();
    assert_eq!(error, CommandError::Validation(Rejection::UnknownDiscussion));
    assert_eq!(error.public_message(), "discussion does not exist");
    assert_eq!(harness.documents.writes(), 0);
    assert!(harness.event_bus.published().is_empty());
}

#[tokio::test]
async fn unknown_author_is_rejected_without_side_effects() {
    let harness = seeded().await;

    let result = harness
        .handler
        .post_answer(&fixtures::answer_body("ghost", "d1"))
        .await;

    assert_eq!(
        result,
        Err(CommandError::Validation(Rejection::UnknownAuthor))
    );
    assert_eq!(harness.documents.writes(), 0);
    assert!(harness.event_bus.published().is_empty());
}

#[tokio::test]
async fn discussion_is_checked_before_author() {
    let harness = CommandHarness::new();

    let result = harness
        .handler
        .post_answer(&fixtures::answer_body("ghost", "missing"))
        .await;

    assert_eq!(
        result,
        Err(CommandError::Validation(Rejection::UnknownDiscussion))
    );
}

#[tokio::test]
async fn projection_failure_is_a_dependency_error() {
    let harness = seeded().await;
    harness.projections.fail_with("projection db down");

    let result = harness
        .handler
        .post_answer(&fixtures::answer_body("u1", "d1"))
        .await;

    assert!(matches!(
        result,
        Err(CommandError::Dependency { stage: Stage::DiscussionLookup, ref detail })
            if detail.contains("projection db down")
    ));
    assert_eq!(harness.documents.writes(), 0);
}

#[tokio::test]
async fn author_lookup_failure_is_a_dependency_error() {
    let harness = seeded().await;
    harness.projections.fail_user_lookups_with("users collection down");

    let error = harness
        .handler
        .post_answer(&fixtures::answer_body("u1", "d1"))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        CommandError::Dependency { stage: Stage::AuthorLookup, ref detail }
            if detail.contains("users collection down")
    ));
    assert_eq!(error.public_message(), "cannot verify author");
    assert_eq!(harness.documents.writes(), 0);
    assert!(harness.event_bus.published().is_empty());
}

#[tokio::test]
async fn persistence_failure_is_not_published() {
    let harness = seeded().await;
    harness.documents.fail_with("disk full");

    let error = harness
        .handler
        .post_answer(&fixtures::answer_body("u1", "d1"))
        .await
        .unwrap_err();

    assert_eq!(error.public_message(), "cannot save answer");
    assert!(harness.event_bus.published().is_empty());
}

#[tokio::test]
async fn duplicate_answer_id_cannot_be_saved() {
    let harness = seeded().await;
    let request = body(&json!({
        "id": "a1",
        "content": "hi",
        "author": "u1",
        "discussion": "d1",
    }));

    harness.handler.post_answer(&request).await.unwrap();
    let error = harness.handler.post_answer(&request).await.unwrap_err();

    assert!(matches!(
        error,
        CommandError::Dependency { stage: Stage::Persist, .. }
    ));
    assert_eq!(harness.event_bus.published_to(ANSWERS_TOPIC).len(), 1);
}

#[tokio::test]
async fn publish_failure_leaves_answer_persisted() {
    let harness = seeded().await;
    harness.event_bus.fail_publish_with("broker unreachable");

    let error = harness
        .handler
        .post_answer(&body(&json!({
            "id": "a1",
            "content": "hi",
            "author": "u1",
            "discussion": "d1",
        })))
        .await
        .unwrap_err();

    assert_eq!(error.public_message(), "failed to send message");
    assert!(harness.documents.get(Collection::Answers, "a1").await.is_some());
    assert!(harness.event_bus.published().is_empty());
}

#[tokio::test]
async fn published_tag_is_answer_posted() {
    let harness = seeded().await;
    harness
        .handler
        .post_answer(&fixtures::answer_body("u1", "d1"))
        .await
        .unwrap();

    let message = &harness.event_bus.published_to(ANSWERS_TOPIC)[0];
    let event = DomainEvent::from_message(message).unwrap();
    assert_eq!(event.tag(), EventTag::AnswerPosted);
}
