//! Student records server and command-line tools.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: SQLite database path, when not set in `config.toml`
//! - `RECORDS_SERVER__HOST`, `RECORDS_SERVER__PORT`, `RECORDS_DATABASE__URL`,
//!   `RECORDS_DATABASE__POOL_SIZE`: override the matching configuration keys
//! - `RUST_LOG`: log filter (default: info)

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use student_records::cli::{Cli, Command};
use student_records::http::{AppState, create_router};
use student_records::{RecordsManager, StudentFilter, display, sample};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    let manager = RecordsManager::from_settings(&settings.database)?;
    info!(database = %settings.database.url, "opened student records");

    match cli.command {
        Command::Serve { .. } => {
            let addr = settings.server.bind_addr()?;
            tokio::runtime::Runtime::new()?.block_on(serve(manager, addr))?;
        }
        Command::GenerateSample => {
            let created = sample::generate_sample_data(&manager, &mut rand::thread_rng())?;
            println!("Generated {created} sample students.");
        }
        Command::Report { verbose, filter } => {
            display::show_report(&manager, &StudentFilter::from(filter), verbose)?;
        }
        Command::Show { student_id } => {
            display::show_student_info(&manager, student_id)?;
        }
        Command::Export { path, filter } => {
            let written = display::export_report(&manager, &StudentFilter::from(filter), &path)?;
            println!("Wrote {written} students to {}", path.display());
        }
    }

    Ok(())
}

async fn serve(manager: RecordsManager, addr: SocketAddr) -> Result<()> {
    let app = create_router(AppState::new(manager));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
