use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Server-side state of one result-confirmation run. The accepted and
/// rejected sets are snapshotted at start; interviews scored afterwards
/// belong to the next run.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResultWorkflow {
    pub id: Uuid,
    pub step: String,
    pub furthest_step: String,
    pub accepted_ids: JsonValue,
    pub rejected_ids: JsonValue,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResultWorkflow {
    pub fn accepted(&self) -> Result<Vec<Uuid>> {
        Ok(serde_json::from_value(self.accepted_ids.clone())?)
    }

    pub fn rejected(&self) -> Result<Vec<Uuid>> {
        Ok(serde_json::from_value(self.rejected_ids.clone())?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    ReviewingAccepted,
    ReviewingRejected,
    FinalConfirm,
    Dispatched,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::ReviewingAccepted => "reviewing_accepted",
            WorkflowStep::ReviewingRejected => "reviewing_rejected",
            WorkflowStep::FinalConfirm => "final_confirm",
            WorkflowStep::Dispatched => "dispatched",
        }
    }

    pub(crate) fn index(&self) -> u8 {
        match self {
            WorkflowStep::ReviewingAccepted => 0,
            WorkflowStep::ReviewingRejected => 1,
            WorkflowStep::FinalConfirm => 2,
            WorkflowStep::Dispatched => 3,
        }
    }
}

impl std::str::FromStr for WorkflowStep {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reviewing_accepted" => Ok(WorkflowStep::ReviewingAccepted),
            "reviewing_rejected" => Ok(WorkflowStep::ReviewingRejected),
            "final_confirm" => Ok(WorkflowStep::FinalConfirm),
            "dispatched" => Ok(WorkflowStep::Dispatched),
            other => Err(format!("unknown workflow step: {}", other)),
        }
    }
}

/// Step-transition rules for the confirmation wizard.
///
/// Confirming the current review step advances it. Moving to any step
/// already visited needs no confirmation; `furthest` remembers how far the
/// run has gone, so rewinding and returning forward does not re-confirm
/// steps that were confirmed once. Declining (`confirmed = false`) is a
/// no-op. The final step is only left through dispatch, and a dispatched
/// workflow never moves again.
pub fn apply_confirmation(
    current: WorkflowStep,
    furthest: WorkflowStep,
    requested: WorkflowStep,
    confirmed: bool,
) -> std::result::Result<WorkflowStep, String> {
    if current == WorkflowStep::Dispatched {
        return Err("workflow has already been dispatched".to_string());
    }
    if requested == WorkflowStep::Dispatched {
        return Err("dispatch happens through finalize, not step confirmation".to_string());
    }
    if requested != current {
        if requested.index() <= furthest.index() {
            return Ok(requested);
        }
        return Err(format!(
            "cannot jump ahead to {}; the furthest visited step is {}",
            requested.as_str(),
            furthest.as_str()
        ));
    }
    if !confirmed {
        return Ok(current);
    }
    match current {
        WorkflowStep::ReviewingAccepted => Ok(WorkflowStep::ReviewingRejected),
        WorkflowStep::ReviewingRejected => Ok(WorkflowStep::FinalConfirm),
        _ => Err("the final step is confirmed through finalize".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowStep::*;

    #[test]
    fn confirmation_advances_review_steps_in_order() {
        assert_eq!(
            apply_confirmation(ReviewingAccepted, ReviewingAccepted, ReviewingAccepted, true),
            Ok(ReviewingRejected)
        );
        assert_eq!(
            apply_confirmation(ReviewingRejected, ReviewingRejected, ReviewingRejected, true),
            Ok(FinalConfirm)
        );
    }

    #[test]
    fn declining_keeps_the_current_step() {
        assert_eq!(
            apply_confirmation(ReviewingAccepted, ReviewingAccepted, ReviewingAccepted, false),
            Ok(ReviewingAccepted)
        );
    }

    #[test]
    fn rewinding_needs_no_confirmation() {
        assert_eq!(
            apply_confirmation(ReviewingRejected, ReviewingRejected, ReviewingAccepted, false),
            Ok(ReviewingAccepted)
        );
        assert_eq!(
            apply_confirmation(FinalConfirm, FinalConfirm, ReviewingAccepted, false),
            Ok(ReviewingAccepted)
        );
    }

    #[test]
    fn returning_forward_after_a_rewind_needs_no_reconfirmation() {
        assert_eq!(
            apply_confirmation(ReviewingAccepted, FinalConfirm, ReviewingRejected, false),
            Ok(ReviewingRejected)
        );
        assert_eq!(
            apply_confirmation(ReviewingAccepted, FinalConfirm, FinalConfirm, false),
            Ok(FinalConfirm)
        );
    }

    #[test]
    fn cannot_skip_past_the_furthest_visited_step() {
        assert!(
            apply_confirmation(ReviewingAccepted, ReviewingAccepted, FinalConfirm, true).is_err()
        );
        assert!(
            apply_confirmation(ReviewingAccepted, ReviewingRejected, FinalConfirm, false).is_err()
        );
    }

    #[test]
    fn dispatched_is_terminal() {
        assert!(apply_confirmation(Dispatched, Dispatched, ReviewingAccepted, false).is_err());
        assert!(apply_confirmation(FinalConfirm, FinalConfirm, Dispatched, true).is_err());
    }

    #[test]
    fn final_step_only_leaves_through_finalize() {
        assert!(apply_confirmation(FinalConfirm, FinalConfirm, FinalConfirm, true).is_err());
    }
}
