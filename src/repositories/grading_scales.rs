use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{GradeBand, GradingScale};

const COLUMNS: &str = "id, name, description, passing_score, is_default, created_at, updated_at";
const BAND_COLUMNS: &str = "id, scale_id, name, min_score, max_score, grade_point, description";

pub(crate) async fn find_default(pool: &PgPool) -> Result<Option<GradingScale>, sqlx::Error> {
    sqlx::query_as::<_, GradingScale>(&format!(
        "SELECT {COLUMNS} FROM grading_scales WHERE is_default LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_bands(
    pool: &PgPool,
    scale_id: &str,
) -> Result<Vec<GradeBand>, sqlx::Error> {
    sqlx::query_as::<_, GradeBand>(&format!(
        "SELECT {BAND_COLUMNS} FROM grade_bands WHERE scale_id = $1 ORDER BY min_score DESC"
    ))
    .bind(scale_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateScale<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) passing_score: f64,
    pub(crate) is_default: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateScale<'_>,
) -> Result<GradingScale, sqlx::Error> {
    sqlx::query_as::<_, GradingScale>(&format!(
        "INSERT INTO grading_scales (
            id, name, description, passing_score, is_default, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.passing_score)
    .bind(params.is_default)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) struct CreateBand<'a> {
    pub(crate) id: &'a str,
    pub(crate) scale_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) min_score: f64,
    pub(crate) max_score: f64,
    pub(crate) grade_point: Option<f64>,
    pub(crate) description: Option<&'a str>,
}

pub(crate) async fn create_band(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateBand<'_>,
) -> Result<GradeBand, sqlx::Error> {
    sqlx::query_as::<_, GradeBand>(&format!(
        "INSERT INTO grade_bands (
            id, scale_id, name, min_score, max_score, grade_point, description
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {BAND_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.scale_id)
    .bind(params.name)
    .bind(params.min_score)
    .bind(params.max_score)
    .bind(params.grade_point)
    .bind(params.description)
    .fetch_one(executor)
    .await
}
