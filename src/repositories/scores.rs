use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Score;
use crate::db::types::ScoreStatus;

const COLUMNS: &str = "id, submission_id, total_score, percentage_score, reading, status, \
     graded_at, graded_by";

pub(crate) struct UpsertScore<'a> {
    pub(crate) id: &'a str,
    pub(crate) submission_id: &'a str,
    pub(crate) total_score: f64,
    pub(crate) percentage_score: f64,
    pub(crate) reading: &'a str,
    pub(crate) status: ScoreStatus,
    pub(crate) graded_at: PrimitiveDateTime,
    pub(crate) graded_by: Option<&'a str>,
}

/// One score row per submission; regrading overwrites it in place.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: UpsertScore<'_>,
) -> Result<Score, sqlx::Error> {
    sqlx::query_as::<_, Score>(&format!(
        "INSERT INTO scores (
            id, submission_id, total_score, percentage_score, reading, status,
            graded_at, graded_by
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         ON CONFLICT (submission_id)
         DO UPDATE SET total_score = EXCLUDED.total_score,
                       percentage_score = EXCLUDED.percentage_score,
                       reading = EXCLUDED.reading,
                       status = EXCLUDED.status,
                       graded_at = EXCLUDED.graded_at,
                       graded_by = EXCLUDED.graded_by
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.submission_id)
    .bind(params.total_score)
    .bind(params.percentage_score)
    .bind(params.reading)
    .bind(params.status)
    .bind(params.graded_at)
    .bind(params.graded_by)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_submission(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<Score>, sqlx::Error> {
    sqlx::query_as::<_, Score>(&format!("SELECT {COLUMNS} FROM scores WHERE submission_id = $1"))
        .bind(submission_id)
        .fetch_optional(pool)
        .await
}
