//! Schema version management using `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version.
const CURRENT_VERSION: u32 = 2;

/// Runs database migrations up to `CURRENT_VERSION`.
///
/// # Errors
///
/// Returns an error if any SQL statement fails.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        migrate_v1(conn).context("migration to v1 failed")?;
    }
    if version < 2 {
        migrate_v2(conn).context("migration to v2 failed")?;
    }

    if version < CURRENT_VERSION {
        tracing::debug!(from = version, to = CURRENT_VERSION, "database migrated");
    }
    conn.pragma_update(None, "user_version", CURRENT_VERSION)
        .context("failed to update user_version")?;

    Ok(())
}

/// Migration to v1: create the `genres` table.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS genres (
            kind        TEXT NOT NULL,
            id          INTEGER NOT NULL,
            name        TEXT NOT NULL,
            fetched_at  TEXT NOT NULL,
            PRIMARY KEY (kind, id)
        );",
    )
    .context("failed to create genres table")?;

    Ok(())
}

/// Migration to v2: create the `library` table.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS library (
            list         TEXT NOT NULL,
            user_id      TEXT NOT NULL,
            media_id     INTEGER NOT NULL,
            media_type   TEXT NOT NULL,
            title        TEXT NOT NULL,
            poster_path  TEXT,
            created_at   TEXT NOT NULL,
            PRIMARY KEY (list, user_id, media_id, media_type)
        );

        CREATE INDEX IF NOT EXISTS idx_library_created_at ON library(list, user_id, created_at);",
    )
    .context("failed to create library table")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_migrations_idempotent() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        // Assert
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_tables_exist_after_migration() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();

        // Assert
        let tables = table_names(&conn);
        assert!(tables.contains(&String::from("genres")));
        assert!(tables.contains(&String::from("library")));
    }

    #[test]
    fn test_v1_to_v2_keeps_genres() {
        // Arrange: start from v1 with one cached genre
        let conn = Connection::open_in_memory().unwrap();
        migrate_v1(&conn).unwrap();
        conn.pragma_update(None, "user_version", 1u32).unwrap();
        conn.execute(
            "INSERT INTO genres (kind, id, name, fetched_at) VALUES ('movie', 16, 'Animation', '2024-11-02T10:00:00Z')",
            [],
        )
        .unwrap();

        // Act
        run_migrations(&conn).unwrap();

        // Assert
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, 2);
        assert!(table_names(&conn).contains(&String::from("library")));
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM genres", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
