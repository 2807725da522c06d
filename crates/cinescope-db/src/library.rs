//! Offline favorites/watched library.
//!
//! Mirrors the Supabase `favorites` and `watched` tables in a single
//! `library` table keyed by list name.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

/// User id recorded for rows created without a Supabase session.
pub const LOCAL_USER_ID: &str = "local";

/// A library row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRow {
    /// List name (`"favorites"` or `"watched"`).
    pub list: String,
    /// Owner id.
    pub user_id: String,
    /// TMDB ID.
    pub media_id: u64,
    /// `"movie"` or `"tv"`.
    pub media_type: String,
    /// Title at the time it was added.
    pub title: String,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

impl LibraryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            list: row.get(0)?,
            user_id: row.get(1)?,
            media_id: row.get(2)?,
            media_type: row.get(3)?,
            title: row.get(4)?,
            poster_path: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

/// Adds a row. Returns `false` if the title was already in the list.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn add_entry(conn: &Connection, entry: &LibraryRow) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO library
                (list, user_id, media_id, media_type, title, poster_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                entry.list,
                entry.user_id,
                entry.media_id,
                entry.media_type,
                entry.title,
                entry.poster_path,
                entry.created_at,
            ],
        )
        .with_context(|| format!("failed to insert {} into {}", entry.media_id, entry.list))?;
    Ok(inserted > 0)
}

/// Removes a row. Returns `false` if it was not in the list.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn remove_entry(
    conn: &Connection,
    list: &str,
    user_id: &str,
    media_id: u64,
    media_type: &str,
) -> Result<bool> {
    let deleted = conn
        .execute(
            "DELETE FROM library
             WHERE list = ?1 AND user_id = ?2 AND media_id = ?3 AND media_type = ?4",
            rusqlite::params![list, user_id, media_id, media_type],
        )
        .with_context(|| format!("failed to delete {media_id} from {list}"))?;
    Ok(deleted > 0)
}

/// Lists a user's rows of `list`, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_entries(conn: &Connection, list: &str, user_id: &str) -> Result<Vec<LibraryRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT list, user_id, media_id, media_type, title, poster_path, created_at
             FROM library
             WHERE list = ?1 AND user_id = ?2
             ORDER BY created_at DESC, rowid DESC",
        )
        .context("failed to prepare library query")?;

    let rows = stmt
        .query_map([list, user_id], LibraryRow::from_row)
        .context("failed to query library")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read library rows")
}

/// Returns `true` if the title is in the user's `list`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn contains_entry(
    conn: &Connection,
    list: &str,
    user_id: &str,
    media_id: u64,
    media_type: &str,
) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM library
             WHERE list = ?1 AND user_id = ?2 AND media_id = ?3 AND media_type = ?4",
            rusqlite::params![list, user_id, media_id, media_type],
            |_| Ok(()),
        )
        .optional()
        .context("failed to query library")?;
    Ok(found.is_some())
}
