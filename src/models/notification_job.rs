use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A unit of outbound email work tied to one interview's result.
///
/// `attempt_count` increments on every delivery attempt. Terminal states are
/// `sent` (the only path that flips `Interview.notification_sent`) and
/// `failed` after `max_attempts`, recoverable only through an explicit retry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationJob {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub payload_kind: String,
    pub attempt_count: i32,
    pub max_attempts: i32,
    pub state: String,
    pub last_error: Option<String>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Sent,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Sent => "sent",
            JobState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Accepted,
    Rejected,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Accepted => "accepted",
            PayloadKind::Rejected => "rejected",
        }
    }

    /// Maps an interview result to the outbound payload kind. A pending
    /// result has no payload; the caller must refuse to notify.
    pub fn from_result(result: &str) -> Option<PayloadKind> {
        match result {
            "passed" => Some(PayloadKind::Accepted),
            "failed" => Some(PayloadKind::Rejected),
            _ => None,
        }
    }
}

impl std::str::FromStr for PayloadKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(PayloadKind::Accepted),
            "rejected" => Ok(PayloadKind::Rejected),
            other => Err(format!("unknown payload kind: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_kind_follows_interview_result() {
        assert_eq!(PayloadKind::from_result("passed"), Some(PayloadKind::Accepted));
        assert_eq!(PayloadKind::from_result("failed"), Some(PayloadKind::Rejected));
        assert_eq!(PayloadKind::from_result("pending"), None);
    }
}
