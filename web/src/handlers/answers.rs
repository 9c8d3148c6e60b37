//! `POST /answers`

use crate::WebResult;
use crate::state::AppState;
use answers_core::command::{CommandError, Stage};
use axum::{body::Bytes, extract::State, Json};

/// Post an answer to a discussion.
///
/// The body is read as raw bytes so that malformed JSON is reported as
/// a validation failure rather than rejected by an extractor. Runs inside
/// the `http_request` span, so the command handler's logs carry the
/// correlation id.
///
/// # Errors
///
/// - 422 `VALIDATION_ERROR` when the body is not an answer or references
///   an unknown discussion or author
/// - 500 `INTERNAL_SERVER_ERROR` when a dependency fails
pub async fn post_answer(
    State(state): State<AppState>,
    body: Bytes,
) -> WebResult<Json<&'static str>> {
    match state.commands.post_answer(&body).await {
        Ok(_) => {
            metrics::counter!("answers.posted").increment(1);
            Ok(Json("ok"))
        }
        Err(CommandError::Validation(rejection)) => {
            metrics::counter!("answers.rejected", "reason" => rejection.label()).increment(1);
            tracing::debug!(reason = rejection.label(), "Answer rejected");
            Err(CommandError::Validation(rejection).into())
        }
        Err(err @ CommandError::Dependency { stage, .. }) => {
            if stage == Stage::Publish {
                metrics::counter!("answers.publish_failed").increment(1);
            }
            Err(err.into())
        }
    }
}
