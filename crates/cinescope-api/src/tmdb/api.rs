//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::media::{MediaKind, MediaPage};
use super::params::{DiscoverParams, MovieCategory, TimeWindow, TrendingScope, TvCategory};
use super::types::{Genre, MovieDetails, TvDetails, TvSeason, WatchProviders};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Fetches trending movies and/or shows.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn trending(
        &self,
        scope: TrendingScope,
        window: TimeWindow,
        page: u32,
    ) -> Result<MediaPage>;

    /// Fetches a curated movie list (popular, top rated, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_list(&self, category: MovieCategory, page: u32) -> Result<MediaPage>;

    /// Fetches a curated TV list (popular, top rated, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn tv_list(&self, category: TvCategory, page: u32) -> Result<MediaPage>;

    /// Discovers movies or shows by genre, language, and year.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn discover(&self, params: &DiscoverParams) -> Result<MediaPage>;

    /// Searches movies and shows together.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_multi(&self, query: &str, page: u32) -> Result<MediaPage>;

    /// Searches movies.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_movie(&self, query: &str, page: u32) -> Result<MediaPage>;

    /// Searches TV shows.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_tv(&self, query: &str, page: u32) -> Result<MediaPage>;

    /// Fetches movie details with credits and videos.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetails>;

    /// Fetches TV series details with season list, credits, and videos.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn tv_details(&self, series_id: u64) -> Result<TvDetails>;

    /// Fetches TV season details including episode list.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn tv_season(&self, series_id: u64, season_number: u32) -> Result<TvSeason>;

    /// Fetches recommendations for a title.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn recommendations(&self, kind: MediaKind, id: u64, page: u32) -> Result<MediaPage>;

    /// Fetches the official genre list for movies or shows.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn genres(&self, kind: MediaKind) -> Result<Vec<Genre>>;

    /// Fetches streaming availability in the client region.
    ///
    /// Returns `None` if TMDB lists nothing for that region.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn watch_providers(&self, kind: MediaKind, id: u64) -> Result<Option<WatchProviders>>;
}
