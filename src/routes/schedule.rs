use crate::{
    dto::schedule_dto::{AllocatePayload, PlanSlotsPayload},
    error::Result,
    services::schedule_service::{self, SlotWindow},
    AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

#[axum::debug_handler]
pub async fn plan_slots(
    State(_state): State<AppState>,
    Json(payload): Json<PlanSlotsPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let window = SlotWindow {
        start: payload.start_time,
        end: payload.end_time,
        interval_minutes: payload.interval_minutes,
    };
    let slots = schedule_service::plan_slots(&window)?;

    let response = json!({
        "date": payload.date,
        "count": slots.len(),
        "slots": slots,
    });
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn allocate_interviews(
    State(state): State<AppState>,
    Json(payload): Json<AllocatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let window = SlotWindow {
        start: payload.start_time,
        end: payload.end_time,
        interval_minutes: payload.interval_minutes,
    };
    let interviews = state
        .schedule_service
        .allocate(payload.date, payload.room_id, &payload.candidate_ids, &window)
        .await?;

    let response = json!({
        "created": interviews.len(),
        "interviews": interviews,
    });
    Ok((StatusCode::CREATED, Json(response)))
}
