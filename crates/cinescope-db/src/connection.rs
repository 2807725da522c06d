//! Opens the local store holding the genre cache and the offline library.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations::run_migrations;

/// Database file name.
const DB_FILE_NAME: &str = "cinescope.db";

/// How long a writer waits for a lock held by another `cinescope` process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens `cinescope.db` in the data directory, creating it on first use.
///
/// The file lives in `dir` when given, else in `~/.local/share/cinescope`.
/// The browser and one-shot commands may hold it at the same time, so the
/// connection uses WAL journaling and waits up to [`BUSY_TIMEOUT`] for locks.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be opened, the pragmas
/// are rejected, or migrations fail.
pub fn open_db(dir: Option<&PathBuf>) -> Result<Connection> {
    let db_path = resolve_db_path(dir)?;
    tracing::debug!(path = %db_path.display(), "opening database");

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT).context("failed to set busy timeout")?;
    let journal_mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))
        .context("failed to enable WAL journal")?;
    tracing::debug!(journal_mode = %journal_mode, "database opened");

    run_migrations(&conn).context("database migration failed")?;

    Ok(conn)
}

/// Resolves the database file path.
fn resolve_db_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(DB_FILE_NAME));
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("cinescope")
        .join(DB_FILE_NAME))
}
