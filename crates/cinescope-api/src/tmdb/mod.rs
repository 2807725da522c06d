//! TMDB API client module.
//!
//! Handles rate-limited HTTP requests to TMDB API v3 and converts
//! movie and TV responses into the shared [`MediaItem`] view model.

mod api;
mod cache;
mod client;
mod media;
mod params;
mod rate_limiter;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
pub use cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL, SearchCache};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use media::{IMAGE_BASE_URL, MAX_PAGE, MediaItem, MediaKind, MediaPage, image_url};
pub use params::{
    ANIMATION_GENRE_ID, DiscoverParams, MovieCategory, SortBy, TimeWindow, TrendingScope,
    TvCategory,
};
pub use rate_limiter::{DEFAULT_INTERVAL, DEFAULT_LIMIT, SlidingWindowLimiter};
#[allow(clippy::module_name_repetitions)]
pub use types::{
    CastMember, Episode, Genre, MovieDetails, Provider, SeasonSummary, TmdbCredits, TmdbVideos,
    TvDetails, TvSeason, Video, WatchProviders,
};
