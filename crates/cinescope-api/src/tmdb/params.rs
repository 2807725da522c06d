//! Request parameters for TMDB list and discover endpoints.

use super::media::MediaKind;

/// TMDB genre ID for animation.
pub const ANIMATION_GENRE_ID: u32 = 16;

/// Media types covered by a trending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendingScope {
    /// Movies and TV shows (people are dropped).
    #[default]
    All,
    /// Movies only.
    Movie,
    /// TV shows only.
    Tv,
}

impl TrendingScope {
    /// Path segment for `trending/{scope}/{window}`.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

/// Trending time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    /// Last 24 hours.
    Day,
    /// Last 7 days.
    #[default]
    Week,
}

impl TimeWindow {
    /// Path segment for `trending/{scope}/{window}`.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

/// Curated movie lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovieCategory {
    /// `movie/popular`.
    #[default]
    Popular,
    /// `movie/top_rated`.
    TopRated,
    /// `movie/now_playing`.
    NowPlaying,
    /// `movie/upcoming`.
    Upcoming,
}

impl MovieCategory {
    /// Endpoint path relative to the API base.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Popular => "movie/popular",
            Self::TopRated => "movie/top_rated",
            Self::NowPlaying => "movie/now_playing",
            Self::Upcoming => "movie/upcoming",
        }
    }
}

/// Curated TV lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TvCategory {
    /// `tv/popular`.
    #[default]
    Popular,
    /// `tv/top_rated`.
    TopRated,
    /// `tv/on_the_air`.
    OnTheAir,
    /// `tv/airing_today`.
    AiringToday,
}

impl TvCategory {
    /// Endpoint path relative to the API base.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Popular => "tv/popular",
            Self::TopRated => "tv/top_rated",
            Self::OnTheAir => "tv/on_the_air",
            Self::AiringToday => "tv/airing_today",
        }
    }
}

/// Sort orders accepted by `discover/*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Most popular first.
    #[default]
    PopularityDesc,
    /// Best rated first.
    VoteAverageDesc,
    /// Newest first.
    ReleaseDateDesc,
}

impl SortBy {
    /// Query value for `sort_by`, which differs between movies and shows for dates.
    #[must_use]
    pub const fn as_query(self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (Self::PopularityDesc, _) => "popularity.desc",
            (Self::VoteAverageDesc, _) => "vote_average.desc",
            (Self::ReleaseDateDesc, MediaKind::Movie) => "primary_release_date.desc",
            (Self::ReleaseDateDesc, MediaKind::Tv) => "first_air_date.desc",
        }
    }
}

/// Parameters for `discover/movie` and `discover/tv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverParams {
    /// Movies or shows.
    pub kind: MediaKind,
    /// Genres that must all match (`with_genres`, comma-joined).
    pub genre_ids: Vec<u32>,
    /// Sort order.
    pub sort_by: SortBy,
    /// Original language filter (ISO 639-1).
    pub original_language: Option<String>,
    /// Release / first air year.
    pub year: Option<u32>,
    /// Minimum vote count.
    pub min_vote_count: Option<u32>,
    /// Result page (1-500).
    pub page: u32,
}

impl DiscoverParams {
    /// Creates discover params for the given media kind.
    #[must_use]
    pub const fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            genre_ids: Vec::new(),
            sort_by: SortBy::PopularityDesc,
            original_language: None,
            year: None,
            min_vote_count: None,
            page: 1,
        }
    }

    /// Japanese animation of the given kind.
    #[must_use]
    pub fn anime(kind: MediaKind) -> Self {
        Self::new(kind)
            .genre(ANIMATION_GENRE_ID)
            .original_language("ja")
    }

    /// Adds a required genre.
    #[must_use]
    pub fn genre(mut self, genre_id: u32) -> Self {
        if !self.genre_ids.contains(&genre_id) {
            self.genre_ids.push(genre_id);
        }
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Sets the original language filter.
    #[must_use]
    pub fn original_language(mut self, language: impl Into<String>) -> Self {
        self.original_language = Some(language.into());
        self
    }

    /// Sets the year filter.
    #[must_use]
    pub const fn year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    /// Sets the minimum vote count.
    #[must_use]
    pub const fn min_vote_count(mut self, count: u32) -> Self {
        self.min_vote_count = Some(count);
        self
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Endpoint path relative to the API base.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self.kind {
            MediaKind::Movie => "discover/movie",
            MediaKind::Tv => "discover/tv",
        }
    }

    /// Builds the endpoint-specific query pairs.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("sort_by", String::from(self.sort_by.as_query(self.kind))),
            ("page", self.page.to_string()),
            ("include_adult", String::from("false")),
        ];
        if !self.genre_ids.is_empty() {
            let genres: Vec<String> = self.genre_ids.iter().map(ToString::to_string).collect();
            query.push(("with_genres", genres.join(",")));
        }
        if let Some(ref language) = self.original_language {
            query.push(("with_original_language", language.clone()));
        }
        if let Some(year) = self.year {
            let key = match self.kind {
                MediaKind::Movie => "primary_release_year",
                MediaKind::Tv => "first_air_date_year",
            };
            query.push((key, year.to_string()));
        }
        if let Some(count) = self.min_vote_count {
            query.push(("vote_count.gte", count.to_string()));
        }
        query
    }
}
