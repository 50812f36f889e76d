use crate::{dto::workflow_dto::ConfirmStepPayload, error::Result, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

#[axum::debug_handler]
pub async fn start_workflow(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let workflow = state.workflow_service.start().await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let workflow = state.workflow_service.get(id).await?;
    Ok(Json(workflow))
}

pub async fn confirm_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmStepPayload>,
) -> Result<impl IntoResponse> {
    let workflow = state
        .workflow_service
        .confirm_step(id, payload.step, payload.confirmed)
        .await?;
    Ok(Json(workflow))
}

pub async fn finalize_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let enqueued = state.workflow_service.finalize(id).await?;
    Ok(Json(json!({ "enqueued": enqueued })))
}
