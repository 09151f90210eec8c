use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{fetch_course, require_course_manager, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::course::{CourseCreate, CourseResponse, CourseUpdate};
use crate::schemas::user::UserResponse;
use crate::services::access;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:course_id", get(get_course).patch(update_course).delete(delete_course))
        .route("/:course_id/students", get(list_students))
        .route(
            "/:course_id/students/:student_id",
            axum::routing::post(enroll_student).delete(unenroll_student),
        )
        .nest("/:course_id/exams", crate::api::exams::router())
}

async fn create_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    if !access::can_create_course(&user) {
        return Err(ApiError::Forbidden("Only teachers or admins can create courses"));
    }

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            teacher_id: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

/// Admins see everything, teachers their own courses, students the
/// courses they are enrolled in.
async fn list_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = match user.role {
        UserRole::Admin => repositories::courses::list_all(state.db()).await,
        UserRole::Teacher => repositories::courses::list_by_teacher(state.db(), &user.id).await,
        UserRole::Student | UserRole::Reviewer => {
            repositories::courses::list_enrolled(state.db(), &user.id).await
        }
    }
    .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn get_course(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;

    if !access::can_manage_course(&user, &course) {
        let enrolled = repositories::enrollments::is_enrolled(state.db(), &course_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
        if !enrolled {
            return Err(ApiError::Forbidden("You are not enrolled in this course"));
        }
    }

    Ok(Json(CourseResponse::from_db(course)))
}

async fn update_course(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    require_course_manager(&state, &user, &course_id).await?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    repositories::courses::update(
        state.db(),
        &course_id,
        repositories::courses::UpdateCourse {
            title: payload.title,
            description: payload.description,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update course"))?;

    let updated = repositories::courses::fetch_one_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated course"))?;

    Ok(Json(CourseResponse::from_db(updated)))
}

async fn delete_course(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_course_manager(&state, &user, &course_id).await?;

    let deleted = repositories::courses::delete_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;

    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    tracing::info!(user_id = %user.id, course_id = %course_id, "Course deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn list_students(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_course_manager(&state, &user, &course_id).await?;

    let students = repositories::enrollments::list_students(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    Ok(Json(students.into_iter().map(UserResponse::from_db).collect()))
}

async fn enroll_student(
    Path((course_id, student_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_course_manager(&state, &user, &course_id).await?;

    let student = repositories::users::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    if student.role != UserRole::Student {
        return Err(ApiError::BadRequest("User is not a student".to_string()));
    }

    let inserted = repositories::enrollments::enroll(
        state.db(),
        &course_id,
        &student_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to enroll student"))?;

    if !inserted {
        return Err(ApiError::Conflict("Student is already enrolled".to_string()));
    }

    tracing::info!(course_id = %course_id, student_id = %student_id, "Student enrolled");

    Ok(StatusCode::NO_CONTENT)
}

async fn unenroll_student(
    Path((course_id, student_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_course_manager(&state, &user, &course_id).await?;

    let removed = repositories::enrollments::unenroll(state.db(), &course_id, &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to unenroll student"))?;

    if !removed {
        return Err(ApiError::NotFound("Enrollment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
