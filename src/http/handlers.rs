//! HTTP handlers for the REST API.
//!
//! Storage calls are synchronous diesel queries, so every handler hands its work to
//! [`tokio::task::spawn_blocking`] through [`run`].

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use super::dto::{
    AttendancePayload, GenerateSampleResponse, HealthResponse, MarksPayload, RecordListQuery,
    StudentListQuery, StudentPayload,
};
use super::error::AppError;
use super::state::AppState;
use crate::error::RecordsResult;
use crate::manager::RecordsManager;
use crate::models::{Attendance, Marks};
use crate::report::StudentReport;
use crate::sample;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

/// Runs a storage operation on the blocking thread pool.
async fn run<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    F: FnOnce(&RecordsManager) -> RecordsResult<T> + Send + 'static,
    T: Send + 'static,
{
    let manager = state.manager.clone();

    tokio::task::spawn_blocking(move || op(&manager))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(AppError::from)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Answers 503 when storage cannot be queried.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match run(&state, |manager| manager.health_check()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database: "connected".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = ?e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    database: format!("error: {:?}", e),
                }),
            )
        }
    }
}

// =============================================================================
// Students
// =============================================================================

/// GET /api/students/
///
/// Lists students with their derived fields. Supports `semester`, `course` and `search`.
pub async fn list_students(
    State(state): State<AppState>,
    query: Result<Query<StudentListQuery>, QueryRejection>,
) -> HandlerResult<Vec<StudentReport>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let reports = run(&state, move |manager| manager.list_student_reports(&filter)).await?;

    Ok(Json(reports))
}

/// POST /api/students/
pub async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> CreatedResult<StudentReport> {
    let Json(payload) = payload?;
    let fields = payload.validate_new()?;

    let student = run(&state, move |manager| manager.create_student(&fields.as_new())).await?;

    // A new student has no attendance or marks yet.
    Ok((
        StatusCode::CREATED,
        Json(StudentReport::new(student, &[], &[])),
    ))
}

/// GET /api/students/{student_id}/
pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> HandlerResult<StudentReport> {
    let report = run(&state, move |manager| manager.get_student_report(student_id)).await?;

    Ok(Json(report))
}

/// PUT /api/students/{student_id}/
pub async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> HandlerResult<StudentReport> {
    save_student(state, student_id, payload, false).await
}

/// PATCH /api/students/{student_id}/
pub async fn patch_student(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
    payload: Result<Json<StudentPayload>, JsonRejection>,
) -> HandlerResult<StudentReport> {
    save_student(state, student_id, payload, true).await
}

async fn save_student(
    state: AppState,
    student_id: i32,
    payload: Result<Json<StudentPayload>, JsonRejection>,
    partial: bool,
) -> HandlerResult<StudentReport> {
    let Json(payload) = payload?;
    let changes = payload.validate(partial)?;

    let report = run(&state, move |manager| {
        manager.update_student(student_id, &changes)?;
        manager.get_student_report(student_id)
    })
    .await?;

    Ok(Json(report))
}

/// DELETE /api/students/{student_id}/
///
/// Also deletes every attendance and marks row of the student.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    run(&state, move |manager| manager.delete_student(student_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Attendance
// =============================================================================

/// GET /api/attendance/
pub async fn list_attendance(
    State(state): State<AppState>,
    query: Result<Query<RecordListQuery>, QueryRejection>,
) -> HandlerResult<Vec<Attendance>> {
    let Query(query) = query?;
    let student_id = query.student_id()?;
    let records = run(&state, move |manager| manager.list_attendance(student_id)).await?;

    Ok(Json(records))
}

/// POST /api/attendance/
///
/// The row is dated today regardless of the body.
pub async fn create_attendance(
    State(state): State<AppState>,
    payload: Result<Json<AttendancePayload>, JsonRejection>,
) -> CreatedResult<Attendance> {
    let Json(payload) = payload?;
    let (student_id, is_present) = payload.validate_new()?;

    let record = run(&state, move |manager| {
        manager.create_attendance(student_id, is_present)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/attendance/{attendance_id}/
pub async fn get_attendance(
    State(state): State<AppState>,
    Path(attendance_id): Path<i32>,
) -> HandlerResult<Attendance> {
    let record = run(&state, move |manager| manager.get_attendance(attendance_id)).await?;

    Ok(Json(record))
}

/// PUT /api/attendance/{attendance_id}/
pub async fn update_attendance(
    State(state): State<AppState>,
    Path(attendance_id): Path<i32>,
    payload: Result<Json<AttendancePayload>, JsonRejection>,
) -> HandlerResult<Attendance> {
    save_attendance(state, attendance_id, payload, false).await
}

/// PATCH /api/attendance/{attendance_id}/
pub async fn patch_attendance(
    State(state): State<AppState>,
    Path(attendance_id): Path<i32>,
    payload: Result<Json<AttendancePayload>, JsonRejection>,
) -> HandlerResult<Attendance> {
    save_attendance(state, attendance_id, payload, true).await
}

async fn save_attendance(
    state: AppState,
    attendance_id: i32,
    payload: Result<Json<AttendancePayload>, JsonRejection>,
    partial: bool,
) -> HandlerResult<Attendance> {
    let Json(payload) = payload?;
    let changes = payload.validate(partial)?;

    let record = run(&state, move |manager| {
        manager.update_attendance(attendance_id, &changes)
    })
    .await?;

    Ok(Json(record))
}

/// DELETE /api/attendance/{attendance_id}/
pub async fn delete_attendance(
    State(state): State<AppState>,
    Path(attendance_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    run(&state, move |manager| manager.delete_attendance(attendance_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Marks
// =============================================================================

/// GET /api/marks/
pub async fn list_marks(
    State(state): State<AppState>,
    query: Result<Query<RecordListQuery>, QueryRejection>,
) -> HandlerResult<Vec<Marks>> {
    let Query(query) = query?;
    let student_id = query.student_id()?;
    let records = run(&state, move |manager| manager.list_marks(student_id)).await?;

    Ok(Json(records))
}

/// POST /api/marks/
pub async fn create_marks(
    State(state): State<AppState>,
    payload: Result<Json<MarksPayload>, JsonRejection>,
) -> CreatedResult<Marks> {
    let Json(payload) = payload?;
    let fields = payload.validate_new()?;

    let record = run(&state, move |manager| manager.create_marks(&fields.as_new())).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/marks/{marks_id}/
pub async fn get_marks(
    State(state): State<AppState>,
    Path(marks_id): Path<i32>,
) -> HandlerResult<Marks> {
    let record = run(&state, move |manager| manager.get_marks(marks_id)).await?;

    Ok(Json(record))
}

/// PUT /api/marks/{marks_id}/
pub async fn update_marks(
    State(state): State<AppState>,
    Path(marks_id): Path<i32>,
    payload: Result<Json<MarksPayload>, JsonRejection>,
) -> HandlerResult<Marks> {
    save_marks(state, marks_id, payload, false).await
}

/// PATCH /api/marks/{marks_id}/
pub async fn patch_marks(
    State(state): State<AppState>,
    Path(marks_id): Path<i32>,
    payload: Result<Json<MarksPayload>, JsonRejection>,
) -> HandlerResult<Marks> {
    save_marks(state, marks_id, payload, true).await
}

async fn save_marks(
    state: AppState,
    marks_id: i32,
    payload: Result<Json<MarksPayload>, JsonRejection>,
    partial: bool,
) -> HandlerResult<Marks> {
    let Json(payload) = payload?;
    let changes = payload.validate(partial)?;

    let record = run(&state, move |manager| manager.update_marks(marks_id, &changes)).await?;

    Ok(Json(record))
}

/// DELETE /api/marks/{marks_id}/
pub async fn delete_marks(
    State(state): State<AppState>,
    Path(marks_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    run(&state, move |manager| manager.delete_marks(marks_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Sample data
// =============================================================================

/// POST /api/generate_sample_data/
///
/// Attempts to create five random students. Roll number collisions are skipped, so the response
/// may report fewer.
pub async fn generate_sample_data(
    State(state): State<AppState>,
) -> HandlerResult<GenerateSampleResponse> {
    let created = run(&state, |manager| {
        sample::generate_sample_data(manager, &mut rand::thread_rng())
    })
    .await?;

    Ok(Json(GenerateSampleResponse {
        message: format!("Successfully generated {} sample students.", created),
        created,
    }))
}
