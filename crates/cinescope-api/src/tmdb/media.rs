//! Media view model shared by every list endpoint.
//!
//! TMDB describes movies with `title`/`release_date` and shows with
//! `name`/`first_air_date`. Conversion into [`MediaItem`] happens once, at the
//! response boundary, and records the kind explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{TmdbMovieResult, TmdbMultiResult, TmdbPage, TmdbTvResult};

/// Base URL for TMDB images.
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Movie or TV show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A movie.
    Movie,
    /// A TV show.
    Tv,
}

impl MediaKind {
    /// Path segment and `media_type` value used by TMDB.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// Parses a TMDB `media_type` value.
    #[must_use]
    pub fn from_media_type(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movie or show, as displayed in lists.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Movie or show.
    pub kind: MediaKind,
    /// TMDB ID (unique per kind).
    pub id: u64,
    /// Localized title or name.
    pub title: String,
    /// Original title or name.
    pub original_title: Option<String>,
    /// Original language (ISO 639-1).
    pub original_language: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Release or first air date (YYYY-MM-DD).
    pub release_date: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Genre IDs.
    pub genre_ids: Vec<u32>,
    /// Popularity score.
    pub popularity: f64,
    /// Vote average (0-10).
    pub vote_average: f64,
    /// Vote count.
    pub vote_count: u32,
}

impl MediaItem {
    /// Release or first air year.
    #[must_use]
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }

    /// Poster URL at the given TMDB size (e.g. "w342").
    #[must_use]
    pub fn poster_url(&self, size: &str) -> Option<String> {
        self.poster_path.as_deref().map(|p| image_url(p, size))
    }

    /// Public TMDB page for this title.
    #[must_use]
    pub fn tmdb_url(&self) -> String {
        format!("https://www.themoviedb.org/{}/{}", self.kind, self.id)
    }
}

impl From<TmdbMovieResult> for MediaItem {
    fn from(m: TmdbMovieResult) -> Self {
        Self {
            kind: MediaKind::Movie,
            id: m.id,
            title: m.title,
            original_title: non_empty(m.original_title),
            original_language: non_empty(m.original_language),
            overview: non_empty(m.overview),
            release_date: non_empty(m.release_date),
            poster_path: m.poster_path,
            backdrop_path: m.backdrop_path,
            genre_ids: m.genre_ids,
            popularity: m.popularity,
            vote_average: m.vote_average,
            vote_count: m.vote_count,
        }
    }
}

impl From<TmdbTvResult> for MediaItem {
    fn from(t: TmdbTvResult) -> Self {
        Self {
            kind: MediaKind::Tv,
            id: t.id,
            title: t.name,
            original_title: non_empty(t.original_name),
            original_language: non_empty(t.original_language),
            overview: non_empty(t.overview),
            release_date: non_empty(t.first_air_date),
            poster_path: t.poster_path,
            backdrop_path: t.backdrop_path,
            genre_ids: t.genre_ids,
            popularity: t.popularity,
            vote_average: t.vote_average,
            vote_count: t.vote_count,
        }
    }
}

impl MediaItem {
    /// Converts a multi-search entry; people yield `None`.
    #[must_use]
    pub fn from_multi(result: TmdbMultiResult) -> Option<Self> {
        match result {
            TmdbMultiResult::Movie(m) => Some(m.into()),
            TmdbMultiResult::Tv(t) => Some(t.into()),
            TmdbMultiResult::Person(_) => None,
        }
    }
}

/// Highest page TMDB serves; later pages are rejected with HTTP 422.
pub const MAX_PAGE: u32 = 500;

/// A page of media items.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPage {
    /// Current page number.
    pub page: u32,
    /// Total number of pages.
    pub total_pages: u32,
    /// Total number of results reported by TMDB.
    pub total_results: u32,
    /// Items on this page.
    pub items: Vec<MediaItem>,
}

impl MediaPage {
    /// An empty first page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            page: 1,
            total_pages: 0,
            total_results: 0,
            items: Vec::new(),
        }
    }

    /// Last page that can be requested, capped at [`MAX_PAGE`].
    #[must_use]
    pub const fn last_page(&self) -> u32 {
        if self.total_pages < MAX_PAGE {
            self.total_pages
        } else {
            MAX_PAGE
        }
    }

    /// Returns `true` if a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.last_page()
    }
}

impl From<TmdbPage<TmdbMovieResult>> for MediaPage {
    fn from(p: TmdbPage<TmdbMovieResult>) -> Self {
        Self {
            page: p.page,
            total_pages: p.total_pages,
            total_results: p.total_results,
            items: p.results.into_iter().map(MediaItem::from).collect(),
        }
    }
}

impl From<TmdbPage<TmdbTvResult>> for MediaPage {
    fn from(p: TmdbPage<TmdbTvResult>) -> Self {
        Self {
            page: p.page,
            total_pages: p.total_pages,
            total_results: p.total_results,
            items: p.results.into_iter().map(MediaItem::from).collect(),
        }
    }
}

impl From<TmdbPage<TmdbMultiResult>> for MediaPage {
    fn from(p: TmdbPage<TmdbMultiResult>) -> Self {
        Self {
            page: p.page,
            total_pages: p.total_pages,
            total_results: p.total_results,
            items: p
                .results
                .into_iter()
                .filter_map(MediaItem::from_multi)
                .collect(),
        }
    }
}

/// Builds a TMDB image URL from a path and size.
#[must_use]
pub fn image_url(path: &str, size: &str) -> String {
    format!("{IMAGE_BASE_URL}{size}{path}")
}

/// TMDB sends empty strings for unknown dates and texts.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn test_multi_results_are_tagged_and_people_dropped() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/search_multi_dune.json");
        let page: TmdbPage<TmdbMultiResult> = serde_json::from_str(json).unwrap();
        let raw_len = page.results.len();

        // Act
        let media = MediaPage::from(page);

        // Assert
        assert_eq!(raw_len, 3);
        assert_eq!(media.items.len(), 2);
        assert_eq!(media.items[0].kind, MediaKind::Movie);
        assert_eq!(media.items[0].title, "Dune");
        assert_eq!(media.items[1].kind, MediaKind::Tv);
        assert_eq!(media.items[1].title, "Dune : Prophecy");
    }

    #[test]
    fn test_last_page_is_capped() {
        // Arrange
        let mut media = MediaPage::empty();
        media.total_pages = 48_210;

        // Act & Assert
        assert_eq!(media.last_page(), MAX_PAGE);
        media.page = MAX_PAGE;
        assert!(!media.has_next());
        media.total_pages = 3;
        media.page = 2;
        assert_eq!(media.last_page(), 3);
        assert!(media.has_next());
    }

    #[test]
    fn test_movie_list_converts_to_movies() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/movie_popular.json");
        let page: TmdbPage<TmdbMovieResult> = serde_json::from_str(json).unwrap();

        // Act
        let media = MediaPage::from(page);

        // Assert
        assert!(media.has_next());
        assert!(media.items.iter().all(|i| i.kind == MediaKind::Movie));
    }

    #[test]
    fn test_tv_fields_map_to_title_and_date() {
        // Arrange
        let json = r#"{"id":1,"name":"Frieren","original_name":"葬送のフリーレン","first_air_date":"2023-09-29","genre_ids":[16]}"#;
        let raw: TmdbTvResult = serde_json::from_str(json).unwrap();

        // Act
        let item = MediaItem::from(raw);

        // Assert
        assert_eq!(item.kind, MediaKind::Tv);
        assert_eq!(item.title, "Frieren");
        assert_eq!(item.original_title.as_deref(), Some("葬送のフリーレン"));
        assert_eq!(item.year(), Some(2023));
    }

    #[test]
    fn test_empty_release_date_becomes_none() {
        // Arrange
        let json = r#"{"id":2,"title":"Untitled","release_date":""}"#;
        let raw: TmdbMovieResult = serde_json::from_str(json).unwrap();

        // Act
        let item = MediaItem::from(raw);

        // Assert
        assert_eq!(item.release_date, None);
        assert_eq!(item.year(), None);
    }

    #[test]
    fn test_urls() {
        // Arrange
        let json = r#"{"id":438631,"title":"Dune","poster_path":"/abc.jpg"}"#;
        let item = MediaItem::from(serde_json::from_str::<TmdbMovieResult>(json).unwrap());

        // Act & Assert
        assert_eq!(
            item.poster_url("w342").as_deref(),
            Some("https://image.tmdb.org/t/p/w342/abc.jpg")
        );
        assert_eq!(item.tmdb_url(), "https://www.themoviedb.org/movie/438631");
    }

    #[test]
    fn test_media_kind_names() {
        // Arrange & Act & Assert
        assert_eq!(MediaKind::from_media_type("movie"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::from_media_type("tv"), Some(MediaKind::Tv));
        assert_eq!(MediaKind::from_media_type("person"), None);
        assert_eq!(MediaKind::Tv.to_string(), "tv");
    }
}
