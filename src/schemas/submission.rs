use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Answer, Score, Submission};
use crate::db::types::{ScoreStatus, SubmissionStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerSubmission {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(default, alias = "textAnswer")]
    pub(crate) text_answer: Option<String>,
    #[serde(default, alias = "selectedOptionIds")]
    pub(crate) selected_option_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmissionCreate {
    pub(crate) answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerUpdate {
    #[serde(default, alias = "textAnswer")]
    pub(crate) text_answer: Option<String>,
    /// When present, replaces the selected option set.
    #[serde(default, alias = "selectedOptionIds")]
    pub(crate) selected_option_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeRequest {
    #[validate(range(min = 0.0, message = "score must be non-negative"))]
    pub(crate) score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) total_score: f64,
    pub(crate) percentage_score: f64,
    pub(crate) reading: String,
    pub(crate) status: ScoreStatus,
    pub(crate) graded_at: String,
    pub(crate) graded_by: Option<String>,
}

impl ScoreResponse {
    pub(crate) fn from_db(score: Score) -> Self {
        Self {
            total_score: score.total_score,
            percentage_score: score.percentage_score,
            reading: score.reading,
            status: score.status,
            graded_at: format_primitive(score.graded_at),
            graded_by: score.graded_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) text_answer: Option<String>,
    pub(crate) selected_option_ids: Vec<String>,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: Answer, selected_option_ids: Vec<String>) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            text_answer: answer.text_answer,
            selected_option_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) submitted_at: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) graded: bool,
    pub(crate) total_score: Option<f64>,
    pub(crate) answers: Vec<AnswerResponse>,
    pub(crate) score: Option<ScoreResponse>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(
        submission: Submission,
        answers: Vec<AnswerResponse>,
        score: Option<Score>,
    ) -> Self {
        Self {
            id: submission.id,
            exam_id: submission.exam_id,
            student_id: submission.student_id,
            submitted_at: format_primitive(submission.submitted_at),
            status: submission.status,
            graded: submission.graded,
            total_score: submission.total_score,
            answers,
            score: score.map(ScoreResponse::from_db),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionSummaryResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) submitted_at: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) graded: bool,
    pub(crate) total_score: Option<f64>,
}

impl SubmissionSummaryResponse {
    pub(crate) fn from_db(submission: Submission) -> Self {
        Self {
            id: submission.id,
            exam_id: submission.exam_id,
            student_id: submission.student_id,
            submitted_at: format_primitive(submission.submitted_at),
            status: submission.status,
            graded: submission.graded,
            total_score: submission.total_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResultsResponse {
    pub(crate) submission_id: String,
    pub(crate) exam_title: String,
    pub(crate) graded: bool,
    pub(crate) score: Option<ScoreResponse>,
}
