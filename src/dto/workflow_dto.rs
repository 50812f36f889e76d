use crate::models::workflow::WorkflowStep;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfirmStepPayload {
    pub step: WorkflowStep,
    pub confirmed: bool,
}
