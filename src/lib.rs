use anyhow::Result;

pub mod cli;
pub mod display;
pub mod error;
pub mod http;
pub mod manager;
pub mod models;
pub mod report;
pub mod sample;
pub mod schema;
pub mod settings;

pub use crate::error::{FieldErrors, RecordsError, RecordsResult};
pub use crate::manager::{RecordsManager, StudentFilter};
pub use crate::report::StudentReport;

use crate::settings::Settings;

/// Opens the database named by `config.toml` (or the environment), creating its schema if needed.
pub fn create_default_manager() -> Result<RecordsManager> {
    let settings = Settings::load("config")?;

    Ok(RecordsManager::from_settings(&settings.database)?)
}
