use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

const COLUMNS: &str = "id, exam_id, student_id, submitted_at, status, graded, total_score, \
     created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamStatistics {
    pub(crate) total_submissions: i64,
    pub(crate) graded_submissions: i64,
    pub(crate) average_score: Option<f64>,
    pub(crate) highest_score: Option<f64>,
    pub(crate) lowest_score: Option<f64>,
}

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) status: SubmissionStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// The unique (exam_id, student_id) constraint rejects a concurrent
/// duplicate; the caller maps that violation to "already submitted".
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (
            id, exam_id, student_id, submitted_at, status, graded, total_score,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,FALSE,NULL,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.student_id)
    .bind(params.submitted_at)
    .bind(params.status)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!("SELECT {COLUMNS} FROM submissions WHERE id = $1"))
        .bind(submission_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_student_and_exam(
    pool: &PgPool,
    student_id: &str,
    exam_id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE student_id = $1 AND exam_id = $2"
    ))
    .bind(student_id)
    .bind(exam_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE exam_id = $1 ORDER BY submitted_at"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE student_id = $1 ORDER BY submitted_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_grading(
    executor: impl sqlx::PgExecutor<'_>,
    submission_id: &str,
    graded: bool,
    total_score: Option<f64>,
    status: SubmissionStatus,
    updated_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE submissions
         SET graded = $1, total_score = $2, status = $3, updated_at = $4
         WHERE id = $5",
    )
    .bind(graded)
    .bind(total_score)
    .bind(status)
    .bind(updated_at)
    .bind(submission_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn exam_statistics(
    pool: &PgPool,
    exam_id: &str,
) -> Result<ExamStatistics, sqlx::Error> {
    sqlx::query_as::<_, ExamStatistics>(
        "SELECT COUNT(*) AS total_submissions,
                COUNT(*) FILTER (WHERE graded) AS graded_submissions,
                AVG(total_score) FILTER (WHERE graded) AS average_score,
                MAX(total_score) FILTER (WHERE graded) AS highest_score,
                MIN(total_score) FILTER (WHERE graded) AS lowest_score
         FROM submissions
         WHERE exam_id = $1",
    )
    .bind(exam_id)
    .fetch_one(pool)
    .await
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some("23505"),
        _ => false,
    }
}
