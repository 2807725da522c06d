//! Genre cache CRUD operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

/// A cached genre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedGenre {
    /// TMDB genre ID.
    pub id: u32,
    /// Localized genre name.
    pub name: String,
}

/// Replaces all genres of `kind` (`"movie"` or `"tv"`) in the cache.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn save_genres(conn: &Connection, kind: &str, genres: &[CachedGenre]) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("failed to begin transaction")?;

    tx.execute("DELETE FROM genres WHERE kind = ?1", [kind])
        .with_context(|| format!("failed to clear {kind} genres"))?;

    let mut stmt = tx
        .prepare("INSERT INTO genres (kind, id, name, fetched_at) VALUES (?1, ?2, ?3, ?4)")
        .context("failed to prepare genres insert")?;

    let now = Utc::now();
    for g in genres {
        stmt.execute(rusqlite::params![kind, g.id, g.name, now])
            .with_context(|| format!("failed to insert genre {}", g.id))?;
    }

    drop(stmt);
    tx.commit().context("failed to commit genres")?;
    tracing::debug!(kind, count = genres.len(), "genres cached");
    Ok(())
}

/// Loads the genres of `kind`, ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_genres(conn: &Connection, kind: &str) -> Result<Vec<CachedGenre>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM genres WHERE kind = ?1 ORDER BY name COLLATE NOCASE")
        .context("failed to prepare genres query")?;

    let rows = stmt
        .query_map([kind], |row| {
            Ok(CachedGenre {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("failed to query genres")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read genres rows")
}

/// Returns when the genres of `kind` were last saved, or `None` if never.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn genres_fetched_at(conn: &Connection, kind: &str) -> Result<Option<DateTime<Utc>>> {
    conn.query_row(
        "SELECT MIN(fetched_at) FROM genres WHERE kind = ?1",
        [kind],
        |row| row.get(0),
    )
    .context("failed to query genres fetched_at")
}
