//! Local store for CinéScope.
//!
//! Uses `rusqlite` (bundled `SQLite`) to cache TMDB genre lists and to keep
//! an offline favorites/watched library when no Supabase session exists.

mod connection;
/// Genre cache CRUD operations.
pub mod genres;
/// Offline favorites/watched library.
pub mod library;
mod migrations;

#[allow(clippy::module_name_repetitions)]
pub use connection::open_db;
pub use genres::{CachedGenre, genres_fetched_at, load_genres, save_genres};
pub use library::{
    LOCAL_USER_ID, LibraryRow, add_entry, contains_entry, list_entries, remove_entry,
};
