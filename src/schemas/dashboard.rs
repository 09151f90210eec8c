use serde::Serialize;

use crate::schemas::submission::ScoreResponse;
use crate::schemas::user::UserResponse;

#[derive(Debug, Serialize)]
pub(crate) struct ExamStatsResponse {
    pub(crate) exam_id: String,
    pub(crate) total_submissions: i64,
    pub(crate) graded_submissions: i64,
    pub(crate) average_score: Option<f64>,
    pub(crate) highest_score: Option<f64>,
    pub(crate) lowest_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamProgress {
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) graded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) total_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) percentage_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) passed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressMetrics {
    pub(crate) total_exams: i64,
    pub(crate) completed_exams: i64,
    pub(crate) completion_rate: f64,
    pub(crate) average_percentage: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseProgressResponse {
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) exams: Vec<ExamProgress>,
    pub(crate) progress: ProgressMetrics,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentProgressEntry {
    pub(crate) student: UserResponse,
    pub(crate) progress: ProgressMetrics,
    pub(crate) exams: Vec<ExamProgress>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletedExamResponse {
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) submission_id: String,
    pub(crate) submitted_at: String,
    pub(crate) graded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) score: Option<ScoreResponse>,
}
