//! Router configuration for the HTTP API.
//!
//! Resource paths keep their trailing slash, and everything but the health check lives under
//! [`API_PREFIX`].

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

pub const API_PREFIX: &str = "/api";

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS so a front end served from another origin can call the API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Students
        .route(
            "/students/",
            get(handlers::list_students).post(handlers::create_student),
        )
        .route(
            "/students/{student_id}/",
            get(handlers::get_student)
                .put(handlers::update_student)
                .patch(handlers::patch_student)
                .delete(handlers::delete_student),
        )
        // Attendance
        .route(
            "/attendance/",
            get(handlers::list_attendance).post(handlers::create_attendance),
        )
        .route(
            "/attendance/{attendance_id}/",
            get(handlers::get_attendance)
                .put(handlers::update_attendance)
                .patch(handlers::patch_attendance)
                .delete(handlers::delete_attendance),
        )
        // Marks
        .route(
            "/marks/",
            get(handlers::list_marks).post(handlers::create_marks),
        )
        .route(
            "/marks/{marks_id}/",
            get(handlers::get_marks)
                .put(handlers::update_marks)
                .patch(handlers::patch_marks)
                .delete(handlers::delete_marks),
        )
        // Sample data; the hyphenated path is the one the web front end posts to.
        .route(
            "/generate_sample_data/",
            post(handlers::generate_sample_data),
        )
        .route(
            "/generate-sample-data/",
            post(handlers::generate_sample_data),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
