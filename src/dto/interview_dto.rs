use crate::models::interview::{EvaluationScores, InterviewResult};
use serde::Deserialize;
use validator::Validate;

/// Scoring is atomic: all five fields plus a definite result, or nothing.
#[derive(Debug, Deserialize, Validate)]
pub struct ScoreInterviewPayload {
    #[validate(range(min = 1, max = 10, message = "Scores are 1-10"))]
    pub technical_score: Option<i32>,
    #[validate(range(min = 1, max = 10, message = "Scores are 1-10"))]
    pub communication_score: Option<i32>,
    #[validate(range(min = 1, max = 10, message = "Scores are 1-10"))]
    pub problem_solving_score: Option<i32>,
    #[validate(range(min = 1, max = 10, message = "Scores are 1-10"))]
    pub culture_fit_score: Option<i32>,
    #[validate(range(min = 1, max = 10, message = "Scores are 1-10"))]
    pub overall_score: Option<i32>,
    pub interviewer_notes: Option<String>,
    pub result: InterviewResult,
}

impl ScoreInterviewPayload {
    /// Collapses the optional fields into the required five, naming every
    /// missing one so the operator can fix the form in a single pass.
    pub fn evaluation(&self) -> std::result::Result<EvaluationScores, String> {
        let mut missing = Vec::new();
        if self.technical_score.is_none() {
            missing.push("technical_score");
        }
        if self.communication_score.is_none() {
            missing.push("communication_score");
        }
        if self.problem_solving_score.is_none() {
            missing.push("problem_solving_score");
        }
        if self.culture_fit_score.is_none() {
            missing.push("culture_fit_score");
        }
        if self.overall_score.is_none() {
            missing.push("overall_score");
        }
        if !missing.is_empty() {
            return Err(format!("missing evaluation fields: {}", missing.join(", ")));
        }
        Ok(EvaluationScores {
            technical: self.technical_score.unwrap_or_default(),
            communication: self.communication_score.unwrap_or_default(),
            problem_solving: self.problem_solving_score.unwrap_or_default(),
            culture_fit: self.culture_fit_score.unwrap_or_default(),
            overall: self.overall_score.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ListInterviewsQuery {
    pub status: Option<String>,
    pub result: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(overall: Option<i32>) -> ScoreInterviewPayload {
        ScoreInterviewPayload {
            technical_score: Some(8),
            communication_score: Some(7),
            problem_solving_score: Some(9),
            culture_fit_score: Some(6),
            overall_score: overall,
            interviewer_notes: None,
            result: InterviewResult::Passed,
        }
    }

    #[test]
    fn evaluation_requires_all_five_fields() {
        let err = payload(None).evaluation().unwrap_err();
        assert!(err.contains("overall_score"));
    }

    #[test]
    fn evaluation_is_complete_when_every_field_is_present() {
        let scores = payload(Some(8)).evaluation().unwrap();
        assert_eq!(scores.overall, 8);
        assert_eq!(scores.technical, 8);
    }
}
