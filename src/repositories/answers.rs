use std::collections::HashMap;

use sqlx::PgPool;

use crate::db::models::Answer;

const COLUMNS: &str = "id, submission_id, question_id, text_answer";

pub(crate) async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    submission_id: &str,
    question_id: &str,
    text_answer: Option<&str>,
) -> Result<Answer, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "INSERT INTO answers (id, submission_id, question_id, text_answer)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(submission_id)
    .bind(question_id)
    .bind(text_answer)
    .fetch_one(executor)
    .await
}

pub(crate) async fn insert_selected_option(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: &str,
    option_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO answer_selected_options (answer_id, option_id) VALUES ($1,$2)")
        .bind(answer_id)
        .bind(option_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    answer_id: &str,
) -> Result<Option<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!("SELECT {COLUMNS} FROM answers WHERE id = $1"))
        .bind(answer_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_submission(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "SELECT {COLUMNS} FROM answers WHERE submission_id = $1 ORDER BY id"
    ))
    .bind(submission_id)
    .fetch_all(pool)
    .await
}

/// Selected option ids for every answer of the submission, keyed by
/// answer id.
pub(crate) async fn selected_options_by_submission(
    pool: &PgPool,
    submission_id: &str,
) -> Result<HashMap<String, Vec<String>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT aso.answer_id, aso.option_id
         FROM answer_selected_options aso
         JOIN answers a ON a.id = aso.answer_id
         WHERE a.submission_id = $1",
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await?;

    let mut by_answer: HashMap<String, Vec<String>> = HashMap::new();
    for (answer_id, option_id) in rows {
        by_answer.entry(answer_id).or_default().push(option_id);
    }
    Ok(by_answer)
}

pub(crate) async fn update_text(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: &str,
    text_answer: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE answers SET text_answer = $1 WHERE id = $2")
        .bind(text_answer)
        .bind(answer_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn delete_selected_options(
    executor: impl sqlx::PgExecutor<'_>,
    answer_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM answer_selected_options WHERE answer_id = $1")
        .bind(answer_id)
        .execute(executor)
        .await?;
    Ok(())
}
