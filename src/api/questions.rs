use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{
    fetch_course, fetch_exam_in_course, require_course_manager, CurrentUser,
};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Question, QuestionOption};
use crate::repositories;
use crate::schemas::question::{OptionCreate, QuestionCreate, QuestionResponse, QuestionUpdate};
use crate::services::{access, question_rules};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/:question_id", get(get_question).patch(update_question).delete(delete_question))
}

async fn create_question(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    fetch_exam_in_course(&state, &course_id, &exam_id).await?;
    require_course_manager(&state, &user, &course_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let correct_flags: Vec<bool> = payload.options.iter().map(|option| option.is_correct).collect();
    question_rules::validate_option_set(payload.question_type, &correct_flags)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let question = repositories::questions::create(
        &mut *tx,
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam_id,
            content: &payload.content,
            marks: payload.marks,
            question_type: payload.question_type,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    let options = if payload.question_type.is_objective() {
        insert_options(&mut tx, &question.id, &payload.options).await?
    } else {
        // Options submitted with free-text questions are ignored.
        Vec::new()
    };

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question, options, true))))
}

async fn list_questions(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;
    let exam = fetch_exam_in_course(&state, &course_id, &exam_id).await?;

    let enrolled = repositories::enrollments::is_enrolled(state.db(), &course_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;

    if !access::can_view_exam(&user, &course, exam.published, enrolled) {
        return Err(ApiError::Forbidden(
            "You don't have permission to view questions for this exam",
        ));
    }

    let include_correct = access::can_manage_course(&user, &course);
    let questions = repositories::questions::list_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let options = repositories::questions::list_options_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;

    let mut options_by_question: std::collections::HashMap<String, Vec<QuestionOption>> =
        std::collections::HashMap::new();
    for option in options {
        options_by_question.entry(option.question_id.clone()).or_default().push(option);
    }

    let response = questions
        .into_iter()
        .map(|question| {
            let question_options =
                options_by_question.remove(&question.id).unwrap_or_default();
            QuestionResponse::from_db(question, question_options, include_correct)
        })
        .collect();

    Ok(Json(response))
}

async fn get_question(
    Path((course_id, exam_id, question_id)): Path<(String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;
    let exam = fetch_exam_in_course(&state, &course_id, &exam_id).await?;
    let question = fetch_question_in_exam(&state, &exam_id, &question_id).await?;

    let enrolled = repositories::enrollments::is_enrolled(state.db(), &course_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;

    if !access::can_view_exam(&user, &course, exam.published, enrolled) {
        return Err(ApiError::Forbidden("You don't have permission to view this question"));
    }

    let include_correct = access::can_manage_course(&user, &course);
    let options = repositories::questions::list_options_by_question(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;

    Ok(Json(QuestionResponse::from_db(question, options, include_correct)))
}

async fn update_question(
    Path((course_id, exam_id, question_id)): Path<(String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    fetch_exam_in_course(&state, &course_id, &exam_id).await?;
    let question = fetch_question_in_exam(&state, &exam_id, &question_id).await?;
    require_course_manager(&state, &user, &course_id).await?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let question_type = payload.question_type.unwrap_or(question.question_type);

    // Validate against the candidate option set: the replacement when one
    // is supplied, the stored set otherwise.
    let correct_flags: Vec<bool> = match payload.options.as_ref() {
        Some(options) => options.iter().map(|option| option.is_correct).collect(),
        None => repositories::questions::list_options_by_question(state.db(), &question_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list options"))?
            .iter()
            .map(|option| option.is_correct)
            .collect(),
    };
    question_rules::validate_option_set(question_type, &correct_flags)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::questions::update(
        &mut *tx,
        &question_id,
        repositories::questions::UpdateQuestion {
            content: payload.content,
            marks: payload.marks,
            question_type: payload.question_type,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?;

    if let Some(options) = payload.options.as_ref() {
        repositories::questions::delete_options_by_question(&mut *tx, &question_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to replace options"))?;
        if question_type.is_objective() {
            insert_options(&mut tx, &question_id, options).await?;
        }
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let updated = repositories::questions::fetch_one_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated question"))?;
    let options = repositories::questions::list_options_by_question(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;

    Ok(Json(QuestionResponse::from_db(updated, options, true)))
}

async fn delete_question(
    Path((course_id, exam_id, question_id)): Path<(String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    fetch_exam_in_course(&state, &course_id, &exam_id).await?;
    fetch_question_in_exam(&state, &exam_id, &question_id).await?;
    require_course_manager(&state, &user, &course_id).await?;

    let deleted = repositories::questions::delete_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_question_in_exam(
    state: &AppState,
    exam_id: &str,
    question_id: &str,
) -> Result<Question, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?;

    match question {
        Some(question) if question.exam_id == exam_id => Ok(question),
        _ => Err(ApiError::NotFound("Question not found".to_string())),
    }
}

async fn insert_options(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    question_id: &str,
    options: &[OptionCreate],
) -> Result<Vec<QuestionOption>, ApiError> {
    let mut inserted = Vec::with_capacity(options.len());
    for option in options {
        let row = repositories::questions::insert_option(
            &mut **tx,
            &Uuid::new_v4().to_string(),
            question_id,
            &option.content,
            option.is_correct,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create option"))?;
        inserted.push(row);
    }
    Ok(inserted)
}
