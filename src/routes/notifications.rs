use crate::{error::Result, AppState};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

pub async fn queue_status(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let status = state.queue_service.status().await?;
    Ok(Json(status))
}

pub async fn retry_failed(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let retried = state.queue_service.retry_failed().await?;
    Ok(Json(json!({ "retried": retried })))
}
