use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_manager, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Exam, User};
use crate::db::types::{ScoreStatus, UserRole};
use crate::repositories;
use crate::schemas::course::CourseResponse;
use crate::schemas::dashboard::{
    CompletedExamResponse, CourseProgressResponse, ExamProgress, ExamStatsResponse,
    ProgressMetrics, StudentProgressEntry,
};
use crate::schemas::exam::ExamResponse;
use crate::schemas::submission::{ScoreResponse, SubmissionSummaryResponse};
use crate::schemas::user::UserResponse;
use crate::services::{access, submission_intake};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/student/courses", get(student_courses))
        .route("/student/exams/upcoming", get(student_upcoming_exams))
        .route("/student/exams/available", get(student_available_exams))
        .route("/student/exams/completed", get(student_completed_exams))
        .route("/student/submissions", get(student_submissions))
        .route("/student/courses/:course_id/progress", get(student_course_progress))
        .route("/teacher/courses", get(teacher_courses))
        .route("/teacher/exams", get(teacher_exams))
        .route("/teacher/courses/:course_id/students", get(teacher_course_students))
        .route("/teacher/exams/:exam_id/stats", get(teacher_exam_stats))
}

fn require_student(user: &User) -> Result<(), ApiError> {
    if user.role == UserRole::Student {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Student access required"))
    }
}

fn require_teacher(user: &User) -> Result<(), ApiError> {
    if matches!(user.role, UserRole::Teacher | UserRole::Admin) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Teacher access required"))
    }
}

async fn student_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    require_student(&user)?;

    let courses = repositories::courses::list_enrolled(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

/// Published exams in enrolled courses that have not started yet.
async fn student_upcoming_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    require_student(&user)?;

    let now = primitive_now_utc();
    let exams = repositories::exams::list_published_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let upcoming =
        exams.into_iter().filter(|exam| exam.start_time > now).map(ExamResponse::from_db).collect();

    Ok(Json(upcoming))
}

/// Published exams currently inside their window that the student has not
/// submitted yet.
async fn student_available_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    require_student(&user)?;

    let now = primitive_now_utc();
    let exams = repositories::exams::list_published_for_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let mut available = Vec::new();
    for exam in exams {
        if !submission_intake::within_window(now, exam.start_time, exam.end_time) {
            continue;
        }
        let submitted =
            repositories::submissions::find_by_student_and_exam(state.db(), &user.id, &exam.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to check submission"))?;
        if submitted.is_none() {
            available.push(ExamResponse::from_db(exam));
        }
    }

    Ok(Json(available))
}

async fn student_completed_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CompletedExamResponse>>, ApiError> {
    require_student(&user)?;

    let submissions = repositories::submissions::list_by_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    let mut completed = Vec::with_capacity(submissions.len());
    for submission in submissions {
        let exam = repositories::exams::fetch_one_by_id(state.db(), &submission.exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;
        let course = repositories::courses::fetch_one_by_id(state.db(), &exam.course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?;
        let score = repositories::scores::find_by_submission(state.db(), &submission.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch score"))?;

        completed.push(CompletedExamResponse {
            exam_id: exam.id,
            exam_title: exam.title,
            course_id: course.id,
            course_title: course.title,
            submission_id: submission.id,
            submitted_at: format_primitive(submission.submitted_at),
            graded: submission.graded,
            score: score.map(ScoreResponse::from_db),
        });
    }

    Ok(Json(completed))
}

async fn student_submissions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionSummaryResponse>>, ApiError> {
    require_student(&user)?;

    let submissions = repositories::submissions::list_by_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(submissions.into_iter().map(SubmissionSummaryResponse::from_db).collect()))
}

async fn student_course_progress(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CourseProgressResponse>, ApiError> {
    require_student(&user)?;

    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let enrolled = repositories::enrollments::is_enrolled(state.db(), &course_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
    if !enrolled {
        return Err(ApiError::Forbidden("You are not enrolled in this course"));
    }

    let exams = repositories::exams::list_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let (exam_progress, metrics) = progress_over_exams(&state, &exams, &user.id).await?;

    Ok(Json(CourseProgressResponse {
        course_id: course.id,
        course_title: course.title,
        exams: exam_progress,
        progress: metrics,
    }))
}

async fn teacher_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    require_teacher(&user)?;

    let courses = repositories::courses::list_by_teacher(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn teacher_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    require_teacher(&user)?;

    let exams = repositories::exams::list_for_teacher(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from_db).collect()))
}

/// Every enrolled student with their per-exam results for the course.
async fn teacher_course_students(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentProgressEntry>>, ApiError> {
    require_course_manager(&state, &user, &course_id).await?;

    let exams = repositories::exams::list_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;
    let students = repositories::enrollments::list_students(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    let mut entries = Vec::with_capacity(students.len());
    for student in students {
        let (exam_progress, metrics) = progress_over_exams(&state, &exams, &student.id).await?;
        entries.push(StudentProgressEntry {
            student: UserResponse::from_db(student),
            progress: metrics,
            exams: exam_progress,
        });
    }

    Ok(Json(entries))
}

async fn teacher_exam_stats(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamStatsResponse>, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let course = repositories::courses::fetch_one_by_id(state.db(), &exam.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?;

    if !access::can_grade_submission(&user, &course.teacher_id) {
        return Err(ApiError::Forbidden("You don't have permission to view submissions"));
    }

    let stats = repositories::submissions::exam_statistics(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to compute statistics"))?;

    Ok(Json(ExamStatsResponse {
        exam_id: exam.id,
        total_submissions: stats.total_submissions,
        graded_submissions: stats.graded_submissions,
        average_score: stats.average_score,
        highest_score: stats.highest_score,
        lowest_score: stats.lowest_score,
    }))
}

async fn progress_over_exams(
    state: &AppState,
    exams: &[Exam],
    student_id: &str,
) -> Result<(Vec<ExamProgress>, ProgressMetrics), ApiError> {
    let total_exams = exams.len() as i64;
    let mut completed_exams = 0i64;
    let mut scored_exams = 0i64;
    let mut percentage_sum = 0.0;

    let mut exam_progress = Vec::with_capacity(exams.len());
    for exam in exams {
        let submission =
            repositories::submissions::find_by_student_and_exam(state.db(), student_id, &exam.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?;

        let Some(submission) = submission else {
            exam_progress.push(ExamProgress {
                exam_id: exam.id.clone(),
                exam_title: exam.title.clone(),
                submitted: false,
                graded: None,
                total_score: None,
                percentage_score: None,
                reading: None,
                passed: None,
            });
            continue;
        };

        completed_exams += 1;
        let score = repositories::scores::find_by_submission(state.db(), &submission.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch score"))?;

        match score {
            Some(score) if submission.graded => {
                scored_exams += 1;
                percentage_sum += score.percentage_score;
                exam_progress.push(ExamProgress {
                    exam_id: exam.id.clone(),
                    exam_title: exam.title.clone(),
                    submitted: true,
                    graded: Some(true),
                    total_score: Some(score.total_score),
                    percentage_score: Some(score.percentage_score),
                    reading: Some(score.reading),
                    passed: Some(score.status == ScoreStatus::Pass),
                });
            }
            _ => {
                exam_progress.push(ExamProgress {
                    exam_id: exam.id.clone(),
                    exam_title: exam.title.clone(),
                    submitted: true,
                    graded: Some(false),
                    total_score: None,
                    percentage_score: None,
                    reading: None,
                    passed: None,
                });
            }
        }
    }

    let completion_rate =
        if total_exams > 0 { completed_exams as f64 / total_exams as f64 * 100.0 } else { 0.0 };
    let average_percentage =
        if scored_exams > 0 { percentage_sum / scored_exams as f64 } else { 0.0 };

    Ok((
        exam_progress,
        ProgressMetrics { total_exams, completed_exams, completion_rate, average_percentage },
    ))
}
