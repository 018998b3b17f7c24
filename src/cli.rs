//! This module contains the command-line interface [`Cli`] parser for serving and inspecting the
//! student records.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::manager::StudentFilter;
use crate::settings::Settings;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(version, about = "Student records: attendance, marks, and derived remarks")]
pub struct Cli {
    /// Configuration file to read, with or without its extension.
    #[arg(long, default_value = "config")]
    pub config: String,

    /// SQLite database path. Overrides the configuration file and environment.
    #[arg(long)]
    pub database_url: Option<String>,

    /// The different commands available for managing student records.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve {
        /// Address to bind. Overrides the configuration.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind. Overrides the configuration.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create up to five random students with attendance and marks.
    GenerateSample,

    /// Print students with their attendance percentage, average marks, and remarks.
    Report {
        /// Include course and semester.
        #[arg(short, long)]
        verbose: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print one student's report along with their attendance and marks.
    Show { student_id: i32 },

    /// Write the student report to a CSV file.
    Export {
        path: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Filters shared by the listing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only students in this semester.
    #[arg(long)]
    pub semester: Option<i32>,

    /// Only students in this course.
    #[arg(long)]
    pub course: Option<String>,

    /// Terms to look for in the name or roll number.
    #[arg(long)]
    pub search: Option<String>,
}

impl From<FilterArgs> for StudentFilter {
    fn from(args: FilterArgs) -> Self {
        StudentFilter {
            semester: args.semester,
            course: args.course,
            search: args.search,
        }
    }
}

impl Cli {
    /// Loads the configuration named by `--config` and applies the command-line overrides.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(&self.config)?;

        if let Some(database_url) = &self.database_url {
            settings.database.url = database_url.clone();
        }

        if let Command::Serve { host, port } = &self.command {
            if let Some(host) = host {
                settings.server.host = host.clone();
            }
            if let Some(port) = port {
                settings.server.port = *port;
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from([
            "student-records",
            "--config",
            "missing-config",
            "--database-url",
            "other.sqlite3",
            "serve",
            "--port",
            "9001",
        ]);

        let settings = cli.settings().unwrap();
        assert_eq!(settings.database.url, "other.sqlite3");
        assert_eq!(settings.server.port, 9001);
    }

    #[test]
    fn test_parse_report_filters() {
        let cli = Cli::parse_from(["student-records", "report", "-v", "--semester", "3"]);

        match cli.command {
            Command::Report { verbose, filter } => {
                assert!(verbose);
                assert_eq!(StudentFilter::from(filter).semester, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
