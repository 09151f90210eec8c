use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Question, QuestionOption};
use crate::db::types::QuestionType;

const COLUMNS: &str = "id, exam_id, content, marks, question_type, created_at, updated_at";
const OPTION_COLUMNS: &str = "id, question_id, content, is_correct";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) content: &'a str,
    pub(crate) marks: i32,
    pub(crate) question_type: QuestionType,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, content, marks, question_type, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.content)
    .bind(params.marks)
    .bind(params.question_type)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    question_id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(question_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(
    pool: &PgPool,
    question_id: &str,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(question_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY created_at"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn sum_marks_by_exam(pool: &PgPool, exam_id: &str) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(marks), 0)::double precision FROM questions WHERE exam_id = $1",
    )
    .bind(exam_id)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateQuestion {
    pub(crate) content: Option<String>,
    pub(crate) marks: Option<i32>,
    pub(crate) question_type: Option<QuestionType>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
    params: UpdateQuestion,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE questions SET
            content = COALESCE($1, content),
            marks = COALESCE($2, marks),
            question_type = COALESCE($3, question_type),
            updated_at = $4
         WHERE id = $5",
    )
    .bind(params.content)
    .bind(params.marks)
    .bind(params.question_type)
    .bind(params.updated_at)
    .bind(question_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn delete_by_id(pool: &PgPool, question_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM questions WHERE id = $1").bind(question_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn insert_option(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    question_id: &str,
    content: &str,
    is_correct: bool,
) -> Result<QuestionOption, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "INSERT INTO question_options (id, question_id, content, is_correct)
         VALUES ($1,$2,$3,$4)
         RETURNING {OPTION_COLUMNS}",
    ))
    .bind(id)
    .bind(question_id)
    .bind(content)
    .bind(is_correct)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete_options_by_question(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM question_options WHERE question_id = $1")
        .bind(question_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn list_options_by_question(
    pool: &PgPool,
    question_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options WHERE question_id = $1 ORDER BY id"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_options_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(
        "SELECT qo.id, qo.question_id, qo.content, qo.is_correct
         FROM question_options qo
         JOIN questions q ON q.id = qo.question_id
         WHERE q.exam_id = $1
         ORDER BY qo.id",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
