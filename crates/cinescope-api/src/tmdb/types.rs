//! TMDB API response types.

use std::collections::HashMap;

use serde::Deserialize;

// --- Paged lists ---

/// A paged list response (`results`, `page`, `total_pages`, `total_results`).
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    /// Current page number.
    pub page: u32,
    /// Page results.
    pub results: Vec<T>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

/// A movie entry from a list, search, or discover response.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieResult {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Original title.
    pub original_title: Option<String>,
    /// Original language (ISO 639-1).
    pub original_language: Option<String>,
    /// Release date (YYYY-MM-DD, may be empty).
    pub release_date: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
}

/// A TV series entry from a list, search, or discover response.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvResult {
    /// TMDB series ID.
    pub id: u64,
    /// Localized name.
    pub name: String,
    /// Original name.
    pub original_name: Option<String>,
    /// Original language (ISO 639-1).
    pub original_language: Option<String>,
    /// Origin countries (ISO 3166-1).
    #[serde(default)]
    pub origin_country: Vec<String>,
    /// First air date (YYYY-MM-DD, may be empty).
    pub first_air_date: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Popularity score.
    #[serde(default)]
    pub popularity: f64,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
}

/// A person entry from a multi-search or trending response.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPersonResult {
    /// TMDB person ID.
    pub id: u64,
    /// Person name.
    pub name: String,
}

/// An entry of `search/multi` or `trending/all`, tagged by `media_type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum TmdbMultiResult {
    /// A movie.
    Movie(TmdbMovieResult),
    /// A TV series.
    Tv(TmdbTvResult),
    /// A person.
    Person(TmdbPersonResult),
}

// --- Details ---

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Response from `genre/{movie,tv}/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    /// Genres.
    pub genres: Vec<Genre>,
}

/// Cast member from `credits`.
#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    /// TMDB person ID.
    pub id: u64,
    /// Actor name.
    pub name: String,
    /// Character played.
    pub character: Option<String>,
    /// Billing order.
    #[serde(default)]
    pub order: u32,
    /// Profile image path.
    pub profile_path: Option<String>,
}

/// `credits` block appended to details.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbCredits {
    /// Cast, in billing order.
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

/// Video (trailer, teaser, ...) from `videos`.
#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    /// Site-specific key (e.g. the `YouTube` video ID).
    pub key: String,
    /// Video title.
    pub name: String,
    /// Hosting site (e.g. "`YouTube`").
    pub site: String,
    /// Video type (e.g. "Trailer").
    #[serde(rename = "type")]
    pub video_type: String,
    /// Official flag.
    #[serde(default)]
    pub official: bool,
}

impl Video {
    /// Watch URL for `YouTube` videos.
    #[must_use]
    pub fn watch_url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

/// `videos` block appended to details.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbVideos {
    /// Videos.
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Response from `movie/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Original title.
    pub original_title: Option<String>,
    /// Original language (ISO 639-1).
    pub original_language: Option<String>,
    /// Tagline.
    pub tagline: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Release date.
    pub release_date: Option<String>,
    /// Runtime in minutes.
    pub runtime: Option<u32>,
    /// Status (e.g. "Released").
    pub status: Option<String>,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// IMDb ID.
    pub imdb_id: Option<String>,
    /// Homepage URL.
    pub homepage: Option<String>,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Appended credits.
    #[serde(default)]
    pub credits: TmdbCredits,
    /// Appended videos.
    #[serde(default)]
    pub videos: TmdbVideos,
}

/// Response from `tv/{series_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TvDetails {
    /// TMDB series ID.
    pub id: u64,
    /// Localized name.
    pub name: String,
    /// Original name.
    pub original_name: Option<String>,
    /// Original language (ISO 639-1).
    pub original_language: Option<String>,
    /// Origin countries (ISO 3166-1).
    #[serde(default)]
    pub origin_country: Vec<String>,
    /// Tagline.
    pub tagline: Option<String>,
    /// First air date.
    pub first_air_date: Option<String>,
    /// Last air date.
    pub last_air_date: Option<String>,
    /// Total number of episodes.
    #[serde(default)]
    pub number_of_episodes: u32,
    /// Total number of seasons.
    #[serde(default)]
    pub number_of_seasons: u32,
    /// Season summaries.
    #[serde(default)]
    pub seasons: Vec<SeasonSummary>,
    /// Status (e.g., "Returning Series", "Ended").
    pub status: Option<String>,
    /// Overview text.
    pub overview: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Whether the show is still in production.
    #[serde(default)]
    pub in_production: bool,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Appended credits.
    #[serde(default)]
    pub credits: TmdbCredits,
    /// Appended videos.
    #[serde(default)]
    pub videos: TmdbVideos,
}

/// Season summary within TV details.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonSummary {
    /// TMDB season ID.
    pub id: u64,
    /// Season number (0 = specials).
    pub season_number: u32,
    /// Number of episodes in this season.
    #[serde(default)]
    pub episode_count: u32,
    /// Air date of this season.
    pub air_date: Option<String>,
    /// Season name.
    pub name: String,
    /// Poster image path.
    pub poster_path: Option<String>,
}

/// Response from `tv/{series_id}/season/{season_number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TvSeason {
    /// TMDB season ID.
    pub id: u64,
    /// Season number.
    pub season_number: u32,
    /// Season name.
    pub name: Option<String>,
    /// Season overview.
    pub overview: Option<String>,
    /// Air date.
    pub air_date: Option<String>,
    /// Episodes in this season.
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

/// A single episode within a season.
#[derive(Debug, Clone, Deserialize)]
pub struct Episode {
    /// TMDB episode ID.
    pub id: u64,
    /// Episode number within the season.
    pub episode_number: u32,
    /// Episode name.
    pub name: String,
    /// Episode overview.
    pub overview: Option<String>,
    /// Air date.
    pub air_date: Option<String>,
    /// Runtime in minutes.
    pub runtime: Option<u32>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Still image path.
    pub still_path: Option<String>,
}

// --- Watch providers ---

/// A streaming provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Provider {
    /// TMDB provider ID.
    pub provider_id: u32,
    /// Provider display name.
    pub provider_name: String,
    /// Logo image path.
    pub logo_path: Option<String>,
    /// Display priority (lower first).
    #[serde(default)]
    pub display_priority: u32,
}

/// Availability of a title in one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WatchProviders {
    /// TMDB/JustWatch landing page.
    pub link: Option<String>,
    /// Subscription providers.
    #[serde(default)]
    pub flatrate: Vec<Provider>,
    /// Rental providers.
    #[serde(default)]
    pub rent: Vec<Provider>,
    /// Purchase providers.
    #[serde(default)]
    pub buy: Vec<Provider>,
}

impl WatchProviders {
    /// Returns `true` if no provider of any category is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flatrate.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }
}

/// Response from `{movie,tv}/{id}/watch/providers`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbWatchProvidersResponse {
    /// Availability keyed by region (ISO 3166-1).
    #[serde(default)]
    pub results: HashMap<String, WatchProviders>,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
}
