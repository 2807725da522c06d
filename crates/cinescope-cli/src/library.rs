//! Favorites / watched storage: Supabase when signed in, local `SQLite` otherwise.
#![allow(clippy::future_not_send)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use cinescope_api::supabase::{
    AuthError, LibraryEntry, LibraryItem, ListKind, LocalLibraryApi, Session, SupabaseClient,
};
use cinescope_api::tmdb::MediaKind;
use cinescope_db::{
    LOCAL_USER_ID, LibraryRow, add_entry, contains_entry, list_entries, open_db, remove_entry,
};
use rusqlite::Connection;
use tracing::instrument;

use crate::config::SupabaseConfig;
use crate::session::SessionStore;

/// Where favorites and watched titles are stored.
pub enum LibraryBackend {
    /// Supabase tables owned by the signed-in user.
    Remote {
        /// Supabase client.
        client: SupabaseClient,
        /// Stored session.
        session: Session,
    },
    /// Local database rows owned by the `local` user.
    Local(Connection),
}

impl std::fmt::Debug for LibraryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { session, .. } => f
                .debug_struct("Remote")
                .field("user", &session.display_name())
                .finish(),
            Self::Local(_) => f.write_str("Local"),
        }
    }
}

impl LibraryBackend {
    /// Picks the backend: the stored Supabase session if any, else the local database.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] if the stored session has expired,
    /// or an error if Supabase is not configured or the database cannot be opened.
    #[instrument(skip_all)]
    pub fn open(supabase: &SupabaseConfig, dir: Option<&PathBuf>) -> Result<Self> {
        let store = SessionStore::new(dir)?;
        let Some(session) = store.load()? else {
            let conn = open_db(dir).context("failed to open database")?;
            tracing::debug!("No session, using local library");
            return Ok(Self::Local(conn));
        };

        if session.is_expired_at(Utc::now()) {
            return Err(AuthError::SessionExpired.into());
        }
        let client = build_supabase_client(supabase)?;
        tracing::debug!(user = session.display_name(), "Using Supabase library");
        Ok(Self::Remote { client, session })
    }

    /// Human-readable backend label.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Remote { session, .. } => format!("Supabase ({})", session.display_name()),
            Self::Local(_) => String::from("local"),
        }
    }

    /// Adds a title. Returns `false` if it was already in the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the insert fails.
    #[instrument(skip_all, fields(list = kind.table(), media_id = item.media_id))]
    pub async fn add(&self, kind: ListKind, item: &LibraryItem) -> Result<bool> {
        match self {
            Self::Remote { client, session } => {
                if client
                    .contains(session, kind, item.media_id, item.media_type)
                    .await?
                {
                    return Ok(false);
                }
                client.add(session, kind, item).await?;
                Ok(true)
            }
            Self::Local(conn) => {
                let row = LibraryRow {
                    list: String::from(kind.table()),
                    user_id: String::from(LOCAL_USER_ID),
                    media_id: item.media_id,
                    media_type: String::from(item.media_type.as_str()),
                    title: item.title.clone(),
                    poster_path: item.poster_path.clone(),
                    created_at: Utc::now(),
                };
                add_entry(conn, &row)
            }
        }
    }

    /// Removes a title. Returns `false` if it was not in the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the delete fails.
    #[instrument(skip_all, fields(list = kind.table(), media_id = media_id))]
    pub async fn remove(
        &self,
        kind: ListKind,
        media_id: u64,
        media_type: MediaKind,
    ) -> Result<bool> {
        match self {
            Self::Remote { client, session } => {
                if !client.contains(session, kind, media_id, media_type).await? {
                    return Ok(false);
                }
                client.remove(session, kind, media_id, media_type).await?;
                Ok(true)
            }
            Self::Local(conn) => remove_entry(
                conn,
                kind.table(),
                LOCAL_USER_ID,
                media_id,
                media_type.as_str(),
            ),
        }
    }

    /// Returns `true` if the title is in the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the query fails.
    pub async fn contains(
        &self,
        kind: ListKind,
        media_id: u64,
        media_type: MediaKind,
    ) -> Result<bool> {
        match self {
            Self::Remote { client, session } => {
                client.contains(session, kind, media_id, media_type).await
            }
            Self::Local(conn) => contains_entry(
                conn,
                kind.table(),
                LOCAL_USER_ID,
                media_id,
                media_type.as_str(),
            ),
        }
    }

    /// Lists the titles of a list, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the query fails.
    #[instrument(skip_all, fields(list = kind.table()))]
    pub async fn list(&self, kind: ListKind) -> Result<Vec<LibraryEntry>> {
        match self {
            Self::Remote { client, session } => client.list(session, kind).await,
            Self::Local(conn) => {
                let rows = list_entries(conn, kind.table(), LOCAL_USER_ID)?;
                Ok(rows.into_iter().filter_map(entry_from_row).collect())
            }
        }
    }
}

/// Converts a local row, skipping rows with an unknown media type.
fn entry_from_row(row: LibraryRow) -> Option<LibraryEntry> {
    let Some(media_type) = MediaKind::from_media_type(&row.media_type) else {
        tracing::warn!(
            media_id = row.media_id,
            media_type = %row.media_type,
            "Skipping library row with unknown media type"
        );
        return None;
    };
    Some(LibraryEntry {
        user_id: row.user_id,
        media_id: row.media_id,
        media_type,
        title: row.title,
        poster_path: row.poster_path,
        created_at: row.created_at,
    })
}

/// Builds a `SupabaseClient` from config (already merged with env overrides).
///
/// # Errors
///
/// Returns an error if the URL or anon key is missing or invalid.
pub fn build_supabase_client(config: &SupabaseConfig) -> Result<SupabaseClient> {
    let (Some(url), Some(anon_key)) = (&config.url, &config.anon_key) else {
        bail!(
            "Supabase is not configured: set [supabase] url/anon_key or SUPABASE_URL/SUPABASE_ANON_KEY"
        );
    };
    let url = url::Url::parse(url).with_context(|| format!("invalid Supabase URL: {url}"))?;

    SupabaseClient::builder()
        .url(url)
        .anon_key(anon_key.clone())
        .user_agent(crate::USER_AGENT)
        .build()
        .context("failed to build Supabase client")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn dune() -> LibraryItem {
        LibraryItem {
            media_id: 438_631,
            media_type: MediaKind::Movie,
            title: String::from("Dune"),
            poster_path: Some(String::from("/d5NXSklXo0qyIYkgV94XAgMIckC.jpg")),
        }
    }

    fn local_backend(dir: &tempfile::TempDir) -> LibraryBackend {
        let config = SupabaseConfig::default();
        LibraryBackend::open(&config, Some(&dir.path().to_path_buf())).unwrap()
    }

    #[test]
    fn test_open_without_session_is_local() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();

        // Act
        let backend = local_backend(&dir);

        // Assert
        assert!(matches!(backend, LibraryBackend::Local(_)));
        assert_eq!(backend.label(), "local");
    }

    #[test]
    fn test_open_with_expired_session() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let session: Session =
            serde_json::from_str(include_str!("../../../fixtures/supabase/session.json"))
                .unwrap();
        let data_dir = dir.path().to_path_buf();
        SessionStore::new(Some(&data_dir))
            .unwrap()
            .save(&session)
            .unwrap();

        // Act
        let err = LibraryBackend::open(&SupabaseConfig::default(), Some(&data_dir)).unwrap_err();

        // Assert
        assert_eq!(
            err.downcast_ref::<AuthError>(),
            Some(&AuthError::SessionExpired)
        );
    }

    #[test]
    fn test_build_supabase_client_requires_config() {
        // Arrange
        let config = SupabaseConfig::default();

        // Act
        let result = build_supabase_client(&config);

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Supabase is not configured")
        );
    }

    #[test]
    fn test_build_supabase_client_rejects_bad_url() {
        // Arrange
        let config = SupabaseConfig {
            url: Some(String::from("not a url")),
            anon_key: Some(String::from("anon")),
        };

        // Act
        let result = build_supabase_client(&config);

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("invalid Supabase URL")
        );
    }

    #[tokio::test]
    async fn test_local_add_list_remove() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let backend = local_backend(&dir);
        let item = dune();

        // Act
        let added = backend.add(ListKind::Favorites, &item).await.unwrap();
        let added_again = backend.add(ListKind::Favorites, &item).await.unwrap();
        let favorites = backend.list(ListKind::Favorites).await.unwrap();
        let watched = backend.list(ListKind::Watched).await.unwrap();
        let contained = backend
            .contains(ListKind::Favorites, 438_631, MediaKind::Movie)
            .await
            .unwrap();
        let removed = backend
            .remove(ListKind::Favorites, 438_631, MediaKind::Movie)
            .await
            .unwrap();
        let removed_again = backend
            .remove(ListKind::Favorites, 438_631, MediaKind::Movie)
            .await
            .unwrap();

        // Assert
        assert!(added);
        assert!(!added_again);
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites.first().unwrap().title, "Dune");
        assert_eq!(favorites.first().unwrap().user_id, LOCAL_USER_ID);
        assert!(watched.is_empty());
        assert!(contained);
        assert!(removed);
        assert!(!removed_again);
    }

    #[test]
    fn test_entry_from_row_skips_unknown_type() {
        // Arrange
        let row = LibraryRow {
            list: String::from("favorites"),
            user_id: String::from(LOCAL_USER_ID),
            media_id: 1,
            media_type: String::from("person"),
            title: String::from("Someone"),
            poster_path: None,
            created_at: Utc::now(),
        };

        // Act
        let entry = entry_from_row(row);

        // Assert
        assert!(entry.is_none());
    }
}
