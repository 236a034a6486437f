use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use lms_core::model::DEFAULT_CERTIFICATE_BASE_URL;

/// Course progress tracking and completion service.
#[derive(Debug, Parser)]
#[command(name = "lms", version)]
pub struct Cli {
    /// SQLite database url or path; relative paths resolve against the working directory
    #[arg(long = "db", env = "LMS_DB_URL", default_value = "sqlite://lms.sqlite3", global = true)]
    pub db_url: String,

    /// Address the HTTP server listens on
    #[arg(long, env = "LMS_BIND", default_value = "127.0.0.1:8080", global = true)]
    pub bind: SocketAddr,

    /// Base url certificate links are generated under
    #[arg(
        long,
        env = "LMS_CERTIFICATE_BASE_URL",
        default_value = DEFAULT_CERTIFICATE_BASE_URL,
        global = true
    )]
    pub certificate_base_url: String,

    /// Log filter, e.g. `info` or `services=debug`
    #[arg(long = "log", env = "RUST_LOG", default_value = "info,app=info,services=info", global = true)]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Load a demo catalog: categories, courses, lessons and a webinar
    Seed,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    #[must_use]
    pub fn database_url(&self) -> String {
        normalize_sqlite_url(&self.db_url)
    }
}

/// Turn a bare path or `sqlite:` url into an absolute `sqlite://` url.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its directory) so the pool can open it.
///
/// # Errors
///
/// Returns an error if the url is not a file url or the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }

    Ok(())
}
