use sqlx::PgPool;

use crate::db::models::User;

/// Inserts the association row; returns false when the student was
/// already enrolled.
pub(crate) async fn enroll(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
    enrolled_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO course_enrollments (course_id, student_id, enrolled_at)
         VALUES ($1,$2,$3)
         ON CONFLICT (course_id, student_id) DO NOTHING",
    )
    .bind(course_id)
    .bind(student_id)
    .bind(enrolled_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn unenroll(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM course_enrollments WHERE course_id = $1 AND student_id = $2",
    )
    .bind(course_id)
    .bind(student_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn is_enrolled(
    pool: &PgPool,
    course_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    let found: Option<i32> = sqlx::query_scalar(
        "SELECT 1 FROM course_enrollments WHERE course_id = $1 AND student_id = $2",
    )
    .bind(course_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

pub(crate) async fn list_students(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT u.id, u.email, u.hashed_password, u.full_name, u.role, u.is_active,
                u.created_at, u.updated_at
         FROM users u
         JOIN course_enrollments ce ON ce.student_id = u.id
         WHERE ce.course_id = $1
         ORDER BY ce.enrolled_at",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}
