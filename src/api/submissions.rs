use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{fetch_course, fetch_exam_in_course, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{
    Answer, Course, GradeBand, GradingScale, Question, QuestionOption, Submission,
};
use crate::db::types::{ScoreStatus, SubmissionStatus, UserRole};
use crate::repositories;
use crate::schemas::submission::{
    AnswerResponse, AnswerUpdate, GradeRequest, SubmissionCreate, SubmissionResponse,
    SubmissionResultsResponse, SubmissionSummaryResponse,
};
use crate::services::{access, grading, submission_intake};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_submissions).post(submit_exam))
        .route("/:submission_id", get(get_submission))
        .route("/:submission_id/results", get(get_results))
        .route("/:submission_id/grade", post(grade_submission))
        .route("/:submission_id/answers/:answer_id", patch(update_answer))
}

async fn submit_exam(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmissionCreate>,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    if user.role != UserRole::Student {
        return Err(ApiError::Forbidden("Only students can submit exams"));
    }

    fetch_course(&state, &course_id).await?;
    let exam = fetch_exam_in_course(&state, &course_id, &exam_id).await?;

    if !exam.published {
        return Err(ApiError::BadRequest("Cannot submit to an unpublished exam".to_string()));
    }

    let enrolled = repositories::enrollments::is_enrolled(state.db(), &course_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
    if !enrolled {
        return Err(ApiError::Forbidden("You are not enrolled in this course"));
    }

    let now = primitive_now_utc();
    if !submission_intake::within_window(now, exam.start_time, exam.end_time) {
        return Err(ApiError::BadRequest(
            "Exam is not currently available for submission".to_string(),
        ));
    }

    let existing =
        repositories::submissions::find_by_student_and_exam(state.db(), &user.id, &exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check existing submission"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("You have already submitted this exam".to_string()));
    }

    let questions = repositories::questions::list_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let options = repositories::questions::list_options_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;
    let options_by_question = group_options(options);

    let answer_inputs: Vec<submission_intake::AnswerInput> = payload
        .answers
        .iter()
        .map(|answer| submission_intake::AnswerInput {
            question_id: answer.question_id.clone(),
            text_answer: answer.text_answer.clone(),
            selected_option_ids: answer.selected_option_ids.clone(),
        })
        .collect();

    submission_intake::validate_answer_sheet(&questions, &options_by_question, &answer_inputs)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (scale, bands) = load_default_scale(&state).await?;

    // Insert, grade and score in one transaction; the unique constraint on
    // (exam_id, student_id) settles a concurrent duplicate race.
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let submission_id = Uuid::new_v4().to_string();
    let submission = repositories::submissions::create(
        &mut *tx,
        repositories::submissions::CreateSubmission {
            id: &submission_id,
            exam_id: &exam_id,
            student_id: &user.id,
            submitted_at: now,
            status: SubmissionStatus::Submitted,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| {
        if repositories::submissions::is_unique_violation(&e) {
            ApiError::BadRequest("You have already submitted this exam".to_string())
        } else {
            ApiError::internal(e, "Failed to create submission")
        }
    })?;

    let mut answer_rows = Vec::with_capacity(answer_inputs.len());
    for input in &answer_inputs {
        let answer = repositories::answers::insert(
            &mut *tx,
            &Uuid::new_v4().to_string(),
            &submission_id,
            &input.question_id,
            input.text_answer.as_deref(),
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create answer"))?;

        for option_id in &input.selected_option_ids {
            repositories::answers::insert_selected_option(&mut *tx, &answer.id, option_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to record selected option"))?;
        }

        answer_rows.push((answer, input.selected_option_ids.clone()));
    }

    let selected_by_question: HashMap<String, HashSet<String>> = answer_inputs
        .iter()
        .map(|input| {
            (input.question_id.clone(), input.selected_option_ids.iter().cloned().collect())
        })
        .collect();

    let (total_score, auto_graded) = apply_auto_grading(
        &mut tx,
        &submission_id,
        &questions,
        &options_by_question,
        &selected_by_question,
        &scale,
        &bands,
    )
    .await?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let submission = Submission {
        graded: auto_graded,
        total_score: Some(total_score),
        status: if auto_graded { SubmissionStatus::Graded } else { SubmissionStatus::Submitted },
        ..submission
    };

    let score = repositories::scores::find_by_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch score"))?;

    let answers = answer_rows
        .into_iter()
        .map(|(answer, selected)| AnswerResponse::from_db(answer, selected))
        .collect();

    tracing::info!(
        exam_id = %exam_id,
        student_id = %user.id,
        submission_id = %submission_id,
        auto_graded,
        total_score,
        "Submission accepted"
    );

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from_db(submission, answers, score))))
}

/// Submissions for an exam, visible to the owning teacher and admins.
async fn list_submissions(
    Path((course_id, exam_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionSummaryResponse>>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;
    fetch_exam_in_course(&state, &course_id, &exam_id).await?;

    if !access::can_grade_submission(&user, &course.teacher_id) {
        return Err(ApiError::Forbidden("You don't have permission to view submissions"));
    }

    let submissions = repositories::submissions::list_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(submissions.into_iter().map(SubmissionSummaryResponse::from_db).collect()))
}

async fn get_submission(
    Path((course_id, exam_id, submission_id)): Path<(String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let (course, submission) =
        fetch_submission_scoped(&state, &course_id, &exam_id, &submission_id).await?;

    if !access::can_view_submission(&user, &submission.student_id, &course.teacher_id) {
        return Err(ApiError::Forbidden("You don't have permission to view this submission"));
    }

    let answers = load_answer_responses(&state, &submission_id).await?;
    let score = repositories::scores::find_by_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch score"))?;

    Ok(Json(SubmissionResponse::from_db(submission, answers, score)))
}

async fn get_results(
    Path((course_id, exam_id, submission_id)): Path<(String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResultsResponse>, ApiError> {
    let (course, submission) =
        fetch_submission_scoped(&state, &course_id, &exam_id, &submission_id).await?;
    let exam = fetch_exam_in_course(&state, &course_id, &exam_id).await?;

    if !access::can_view_submission(&user, &submission.student_id, &course.teacher_id) {
        return Err(ApiError::Forbidden(
            "You don't have permission to view this submission's results",
        ));
    }

    let score = repositories::scores::find_by_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch score"))?;

    Ok(Json(SubmissionResultsResponse {
        submission_id: submission.id,
        exam_title: exam.title,
        graded: submission.graded,
        score: score.map(crate::schemas::submission::ScoreResponse::from_db),
    }))
}

async fn grade_submission(
    Path((course_id, exam_id, submission_id)): Path<(String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<GradeRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let (course, submission) =
        fetch_submission_scoped(&state, &course_id, &exam_id, &submission_id).await?;

    if !access::can_grade_submission(&user, &course.teacher_id) {
        return Err(ApiError::Forbidden("You don't have permission to grade this submission"));
    }

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exam_total_marks = repositories::questions::sum_marks_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sum exam marks"))?;

    if payload.score < 0.0 || payload.score > exam_total_marks {
        return Err(ApiError::BadRequest(format!(
            "Score must be between 0 and {exam_total_marks}"
        )));
    }

    let (scale, bands) = load_default_scale(&state).await?;
    let outcome = grading::derive_outcome(payload.score, exam_total_marks, &scale, &bands);
    let now = primitive_now_utc();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::scores::upsert(
        &mut *tx,
        repositories::scores::UpsertScore {
            id: &Uuid::new_v4().to_string(),
            submission_id: &submission_id,
            total_score: payload.score,
            percentage_score: outcome.percentage_score,
            reading: &outcome.reading,
            status: outcome.status,
            graded_at: now,
            graded_by: Some(&user.id),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store score"))?;

    repositories::submissions::update_grading(
        &mut *tx,
        &submission_id,
        true,
        Some(payload.score),
        SubmissionStatus::Graded,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update submission"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        submission_id = %submission_id,
        graded_by = %user.id,
        score = payload.score,
        "Submission graded"
    );

    let submission = Submission {
        graded: true,
        total_score: Some(payload.score),
        status: SubmissionStatus::Graded,
        ..submission
    };
    let answers = load_answer_responses(&state, &submission_id).await?;
    let score = repositories::scores::find_by_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch score"))?;

    Ok(Json(SubmissionResponse::from_db(submission, answers, score)))
}

/// A student may rework an answer only while the submission is ungraded;
/// objective answers are revalidated and the stored total rescored.
async fn update_answer(
    Path((course_id, exam_id, submission_id, answer_id)): Path<(String, String, String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswerUpdate>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let (_course, submission) =
        fetch_submission_scoped(&state, &course_id, &exam_id, &submission_id).await?;

    let answer = repositories::answers::find_by_id(state.db(), &answer_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answer"))?
        .filter(|answer| answer.submission_id == submission_id)
        .ok_or_else(|| ApiError::NotFound("Answer not found".to_string()))?;

    if user.id != submission.student_id {
        return Err(ApiError::Forbidden("You don't have permission to modify this answer"));
    }
    if !access::can_modify_answer(&user, &submission.student_id, submission.graded) {
        return Err(ApiError::BadRequest(
            "Cannot modify an answer after the submission was graded".to_string(),
        ));
    }

    let question = repositories::questions::fetch_one_by_id(state.db(), &answer.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?;

    let text_answer = payload.text_answer.clone().or_else(|| answer.text_answer.clone());
    let selected_option_ids = match payload.selected_option_ids.clone() {
        Some(ids) => ids,
        None => repositories::answers::selected_options_by_submission(state.db(), &submission_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch selected options"))?
            .remove(&answer_id)
            .unwrap_or_default(),
    };

    let question_options =
        repositories::questions::list_options_by_question(state.db(), &question.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list options"))?;
    let mut options_by_question = HashMap::new();
    options_by_question.insert(question.id.clone(), question_options);

    let candidate = submission_intake::AnswerInput {
        question_id: question.id.clone(),
        text_answer: text_answer.clone(),
        selected_option_ids: selected_option_ids.clone(),
    };
    submission_intake::validate_answer_sheet(
        std::slice::from_ref(&question),
        &options_by_question,
        std::slice::from_ref(&candidate),
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let questions = repositories::questions::list_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let all_options = repositories::questions::list_options_by_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;
    let all_options_by_question = group_options(all_options);

    let answers = repositories::answers::list_by_submission(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;
    let mut selected_by_answer =
        repositories::answers::selected_options_by_submission(state.db(), &submission_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch selected options"))?;
    selected_by_answer.insert(answer_id.clone(), selected_option_ids.clone());

    let selected_by_question: HashMap<String, HashSet<String>> = answers
        .iter()
        .map(|row| {
            let selected =
                selected_by_answer.get(&row.id).cloned().unwrap_or_default().into_iter().collect();
            (row.question_id.clone(), selected)
        })
        .collect();

    let (scale, bands) = load_default_scale(&state).await?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::answers::update_text(&mut *tx, &answer_id, text_answer.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update answer"))?;

    if payload.selected_option_ids.is_some() {
        repositories::answers::delete_selected_options(&mut *tx, &answer_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to replace selected options"))?;
        for option_id in &selected_option_ids {
            repositories::answers::insert_selected_option(&mut *tx, &answer_id, option_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to record selected option"))?;
        }
    }

    apply_auto_grading(
        &mut tx,
        &submission_id,
        &questions,
        &all_options_by_question,
        &selected_by_question,
        &scale,
        &bands,
    )
    .await?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let updated = Answer { text_answer, ..answer };
    Ok(Json(AnswerResponse::from_db(updated, selected_option_ids)))
}

/// Computes the objective total, stores it with the derived score row and
/// flips `graded` when no human input is needed. Runs inside the caller's
/// transaction.
async fn apply_auto_grading(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    submission_id: &str,
    questions: &[Question],
    options_by_question: &HashMap<String, Vec<QuestionOption>>,
    selected_by_question: &HashMap<String, HashSet<String>>,
    scale: &GradingScale,
    bands: &[GradeBand],
) -> Result<(f64, bool), ApiError> {
    let answers_to_grade: Vec<grading::AnswerToGrade> = questions
        .iter()
        .map(|question| {
            let correct_option_ids = options_by_question
                .get(&question.id)
                .map(|options| {
                    options
                        .iter()
                        .filter(|option| option.is_correct)
                        .map(|option| option.id.clone())
                        .collect()
                })
                .unwrap_or_default();
            let selected_option_ids =
                selected_by_question.get(&question.id).cloned().unwrap_or_default();

            grading::AnswerToGrade {
                question_type: question.question_type,
                marks: question.marks,
                correct_option_ids,
                selected_option_ids,
            }
        })
        .collect();

    let total_score = grading::total_auto_score(&answers_to_grade);
    let auto_graded =
        grading::is_auto_gradable(questions.iter().map(|question| question.question_type));

    let exam_total_marks = grading::exam_total_marks(questions);
    let outcome = grading::derive_outcome(total_score, exam_total_marks, scale, bands);
    // A submission awaiting manual grading carries an incomplete score.
    let status = if auto_graded { outcome.status } else { ScoreStatus::Incomplete };
    let now = primitive_now_utc();

    repositories::scores::upsert(
        &mut **tx,
        repositories::scores::UpsertScore {
            id: &Uuid::new_v4().to_string(),
            submission_id,
            total_score,
            percentage_score: outcome.percentage_score,
            reading: &outcome.reading,
            status,
            graded_at: now,
            graded_by: None,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store score"))?;

    repositories::submissions::update_grading(
        &mut **tx,
        submission_id,
        auto_graded,
        Some(total_score),
        if auto_graded { SubmissionStatus::Graded } else { SubmissionStatus::Submitted },
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update submission"))?;

    Ok((total_score, auto_graded))
}

async fn fetch_submission_scoped(
    state: &AppState,
    course_id: &str,
    exam_id: &str,
    submission_id: &str,
) -> Result<(Course, Submission), ApiError> {
    let course = fetch_course(state, course_id).await?;
    fetch_exam_in_course(state, course_id, exam_id).await?;

    let submission = repositories::submissions::find_by_id(state.db(), submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .filter(|submission| submission.exam_id == exam_id)
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    Ok((course, submission))
}

async fn load_answer_responses(
    state: &AppState,
    submission_id: &str,
) -> Result<Vec<AnswerResponse>, ApiError> {
    let answers = repositories::answers::list_by_submission(state.db(), submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;
    let mut selected_by_answer =
        repositories::answers::selected_options_by_submission(state.db(), submission_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch selected options"))?;

    Ok(answers
        .into_iter()
        .map(|answer| {
            let selected = selected_by_answer.remove(&answer.id).unwrap_or_default();
            AnswerResponse::from_db(answer, selected)
        })
        .collect())
}

async fn load_default_scale(
    state: &AppState,
) -> Result<(GradingScale, Vec<GradeBand>), ApiError> {
    let scale = repositories::grading_scales::find_default(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load grading scale"))?
        .ok_or_else(|| ApiError::Internal("No default grading scale configured".to_string()))?;

    let bands = repositories::grading_scales::list_bands(state.db(), &scale.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load grade bands"))?;

    Ok((scale, bands))
}

fn group_options(options: Vec<QuestionOption>) -> HashMap<String, Vec<QuestionOption>> {
    let mut by_question: HashMap<String, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id.clone()).or_default().push(option);
    }
    by_question
}
