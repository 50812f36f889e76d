use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One candidate's interview. An application holds at most one interview at
/// a time (enforced by a unique index; duplicate allocation is rejected).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub application_id: Uuid,
    pub room_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub result: String,
    pub technical_score: Option<i32>,
    pub communication_score: Option<i32>,
    pub problem_solving_score: Option<i32>,
    pub culture_fit_score: Option<i32>,
    pub overall_score: Option<i32>,
    pub interviewer_notes: Option<String>,
    pub notification_sent: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for InterviewStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(InterviewStatus::Scheduled),
            "completed" => Ok(InterviewStatus::Completed),
            other => Err(format!("unknown interview status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewResult {
    Pending,
    Passed,
    Failed,
}

impl InterviewResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewResult::Pending => "pending",
            InterviewResult::Passed => "passed",
            InterviewResult::Failed => "failed",
        }
    }
}

impl std::str::FromStr for InterviewResult {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InterviewResult::Pending),
            "passed" => Ok(InterviewResult::Passed),
            "failed" => Ok(InterviewResult::Failed),
            other => Err(format!("unknown interview result: {}", other)),
        }
    }
}

/// The five required evaluation fields, all 1-10. Scoring is all-or-nothing:
/// this type only exists once every field is present.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvaluationScores {
    pub technical: i32,
    pub communication: i32,
    pub problem_solving: i32,
    pub culture_fit: i32,
    pub overall: i32,
}
