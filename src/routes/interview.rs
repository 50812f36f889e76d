use crate::{
    dto::interview_dto::{ListInterviewsQuery, ScoreInterviewPayload},
    error::{Error, Result},
    models::notification_job::PayloadKind,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

pub async fn list_interviews(
    State(state): State<AppState>,
    Query(query): Query<ListInterviewsQuery>,
) -> Result<impl IntoResponse> {
    let interviews = state
        .interview_service
        .list(query.status.as_deref(), query.result.as_deref())
        .await?;
    Ok(Json(json!({
        "count": interviews.len(),
        "interviews": interviews,
    })))
}

pub async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interview = state.interview_service.get(id).await?;
    Ok(Json(interview))
}

#[axum::debug_handler]
pub async fn score_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScoreInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let interview = state.interview_service.score(id, &payload).await?;
    Ok(Json(interview))
}

/// Single-send path: equivalent to enqueueing one job, with the same
/// idempotence rule as the bulk dispatch.
pub async fn send_single_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interview = state.interview_service.get(id).await?;
    let kind = PayloadKind::from_result(&interview.result).ok_or_else(|| {
        Error::BadRequest("Interview result is still pending; there is nothing to notify".to_string())
    })?;

    let job = state.queue_service.enqueue(id, kind).await?;
    Ok(Json(json!({
        "enqueued": job.is_some(),
        "job": job,
    })))
}
