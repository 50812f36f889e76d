use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct PlanSlotsPayload {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(range(
        min = 1,
        max = 1440,
        message = "Interval must be between 1 minute and one day"
    ))]
    pub interval_minutes: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AllocatePayload {
    pub room_id: Uuid,
    #[validate(length(min = 1, message = "At least one candidate is required"))]
    pub candidate_ids: Vec<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(range(
        min = 1,
        max = 1440,
        message = "Interval must be between 1 minute and one day"
    ))]
    pub interval_minutes: i64,
}
