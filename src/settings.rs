//! Runtime configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional `config.toml` (or the
//! file given on the command line), `RECORDS_*` environment variables, and finally `DATABASE_URL`
//! for the database location when the other sources leave it unset.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    /// Path of the SQLite database file.
    pub url: String,
    pub pool_size: u32,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl Settings {
    /// Loads settings from the file `config_name` (extension optional, file optional).
    pub fn load(config_name: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.url", "records.sqlite3")?
            .set_default("database.pool_size", 8)?
            .add_source(File::with_name(config_name).required(false))
            .add_source(
                Environment::with_prefix("RECORDS")
                    .prefix_separator("_")
                    .separator("__"),
            );

        if env::var("RECORDS_DATABASE__URL").is_err() {
            if let Ok(database_url) = env::var("DATABASE_URL") {
                builder = builder.set_override("database.url", database_url)?;
            }
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
