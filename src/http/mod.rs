//! HTTP API for the student records.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  HTTP layer (axum handlers)                  │
//! │  - payload validation, JSON in and out       │
//! │  - CORS, request tracing, error mapping      │
//! └──────────────────────┬───────────────────────┘
//!                        │ spawn_blocking
//! ┌──────────────────────▼───────────────────────┐
//! │  RecordsManager (diesel over SQLite)         │
//! │  - CRUD, cascade delete, derived reports     │
//! └──────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
