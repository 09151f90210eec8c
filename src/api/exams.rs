use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{
    fetch_course, fetch_exam_in_course, require_course_manager, CurrentUser,
};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse, ExamUpdate};
use crate::services::access;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exams).post(create_exam))
        .route("/:exam_id", get(get_exam).patch(update_exam).delete(delete_exam))
        .route("/:exam_id/publish", post(publish_exam))
        .route("/:exam_id/unpublish", post(unpublish_exam))
        .nest("/:exam_id/questions", crate::api::questions::router())
        .nest("/:exam_id/submissions", crate::api::submissions::router())
}

async fn create_exam(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    require_course_manager(&state, &user, &course_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if payload.end_time <= payload.start_time {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }

    let now = primitive_now_utc();
    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            course_id: &course_id,
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            start_time: to_primitive_utc(payload.start_time),
            end_time: to_primitive_utc(payload.end_time),
            duration_minutes: payload.duration_minutes,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

/// Course managers see every exam; enrolled students only published ones.
async fn list_exams(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;

    let exams = if access::can_manage_course(&user, &course) {
        repositories::exams::list_by_course(state.db(), &course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list exams"))?
    } else {
        let enrolled = repositories::enrollments::is_enrolled(state.db(), &course_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
        if !enrolled {
            return Err(ApiError::Forbidden("You are not enrolled in this course"));
        }
        repositories::exams::list_published_by_course(state.db(), &course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list exams"))?
    };

    Ok(Json(exams.into_iter().map(ExamResponse::from_db).collect()))
}

async fn get_exam(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;
    let exam = fetch_exam_in_course(&state, &course_id, &exam_id).await?;

    let enrolled = repositories::enrollments::is_enrolled(state.db(), &course_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;

    if !access::can_view_exam(&user, &course, exam.published, enrolled) {
        return Err(ApiError::Forbidden("You don't have permission to view this exam"));
    }

    Ok(Json(ExamResponse::from_db(exam)))
}

async fn update_exam(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = fetch_exam_in_course(&state, &course_id, &exam_id).await?;
    require_course_manager(&state, &user, &course_id).await?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let start_time = payload.start_time.map(to_primitive_utc).unwrap_or(exam.start_time);
    let end_time = payload.end_time.map(to_primitive_utc).unwrap_or(exam.end_time);
    if end_time <= start_time {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }

    repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            title: payload.title,
            description: payload.description,
            start_time: payload.start_time.map(to_primitive_utc),
            end_time: payload.end_time.map(to_primitive_utc),
            duration_minutes: payload.duration_minutes,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?;

    let updated = repositories::exams::fetch_one_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated exam"))?;

    Ok(Json(ExamResponse::from_db(updated)))
}

async fn delete_exam(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    fetch_exam_in_course(&state, &course_id, &exam_id).await?;
    require_course_manager(&state, &user, &course_id).await?;

    let deleted = repositories::exams::delete_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;

    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn publish_exam(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    fetch_exam_in_course(&state, &course_id, &exam_id).await?;
    require_course_manager(&state, &user, &course_id).await?;

    let question_count = repositories::exams::count_questions(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
    if question_count == 0 {
        return Err(ApiError::BadRequest("Cannot publish an exam with no questions".to_string()));
    }

    repositories::exams::set_published(state.db(), &exam_id, true, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish exam"))?;

    let updated = repositories::exams::fetch_one_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated exam"))?;

    tracing::info!(exam_id = %exam_id, user_id = %user.id, "Exam published");

    Ok(Json(ExamResponse::from_db(updated)))
}

async fn unpublish_exam(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    fetch_exam_in_course(&state, &course_id, &exam_id).await?;
    require_course_manager(&state, &user, &course_id).await?;

    repositories::exams::set_published(state.db(), &exam_id, false, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to unpublish exam"))?;

    let updated = repositories::exams::fetch_one_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated exam"))?;

    Ok(Json(ExamResponse::from_db(updated)))
}
