//! `TmdbClient` - TMDB API client implementation.

use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::LocalTmdbApi;
use super::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL, SearchCache};
use super::media::{MediaKind, MediaPage};
use super::params::{DiscoverParams, MovieCategory, TimeWindow, TrendingScope, TvCategory};
use super::rate_limiter::{DEFAULT_INTERVAL, DEFAULT_LIMIT, SlidingWindowLimiter};
use super::types::{
    Genre, MovieDetails, TmdbErrorResponse, TmdbGenreList, TmdbMovieResult, TmdbMultiResult,
    TmdbPage, TmdbTvResult, TmdbWatchProvidersResponse, TvDetails, TvSeason, WatchProviders,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default response language.
const DEFAULT_LANGUAGE: &str = "fr-FR";

/// Default watch-provider region.
const DEFAULT_REGION: &str = "FR";

/// Blocks appended to detail requests.
const DETAILS_APPEND: &str = "credits,videos";

/// How the client authenticates.
#[derive(Clone)]
enum Credentials {
    /// v3 API key, sent as the `api_key` query parameter.
    ApiKey(String),
    /// v4 read access token, sent as a bearer token.
    Bearer(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Which search endpoint a cache serves.
#[derive(Debug, Clone, Copy)]
enum SearchScope {
    Multi,
    Movie,
    Tv,
}

impl SearchScope {
    const fn path(self) -> &'static str {
        match self {
            Self::Multi => "search/multi",
            Self::Movie => "search/movie",
            Self::Tv => "search/tv",
        }
    }
}

/// One search cache per search endpoint.
#[derive(Debug)]
struct SearchCaches {
    multi: StdMutex<SearchCache<MediaPage>>,
    movie: StdMutex<SearchCache<MediaPage>>,
    tv: StdMutex<SearchCache<MediaPage>>,
}

impl SearchCaches {
    fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            multi: StdMutex::new(SearchCache::new(max_entries, ttl)),
            movie: StdMutex::new(SearchCache::new(max_entries, ttl)),
            tv: StdMutex::new(SearchCache::new(max_entries, ttl)),
        }
    }

    /// Locks the cache for `scope`. Cache operations cannot leave it inconsistent,
    /// so a poisoned lock is recovered.
    fn lock(&self, scope: SearchScope) -> MutexGuard<'_, SearchCache<MediaPage>> {
        let mutex = match scope {
            SearchScope::Multi => &self.multi,
            SearchScope::Movie => &self.movie,
            SearchScope::Tv => &self.tv,
        };
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// TMDB API client.
///
/// Owns its rate limiter and search caches; clones share both.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// API key or bearer token.
    credentials: Credentials,
    /// Response language (e.g. "fr-FR").
    language: String,
    /// Watch-provider region (ISO 3166-1).
    region: String,
    /// Rate limiter.
    rate_limiter: Arc<Mutex<SlidingWindowLimiter>>,
    /// Search result caches.
    search_cache: Arc<SearchCaches>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    api_token: Option<String>,
    user_agent: Option<String>,
    language: Option<String>,
    region: Option<String>,
    rate_limit: Option<(usize, Duration)>,
    cache: Option<(usize, Duration)>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            api_token: None,
            user_agent: None,
            language: None,
            region: None,
            rate_limit: None,
            cache: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the v3 API key (sent as a query parameter).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the v4 read access token (sent as a bearer token).
    ///
    /// Takes precedence over [`Self::api_key`].
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (default: "fr-FR").
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the watch-provider region (default: "FR").
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Allows at most `limit` requests per `interval` (default: 40 per second).
    #[must_use]
    pub const fn rate_limit(mut self, limit: usize, interval: Duration) -> Self {
        self.rate_limit = Some((limit, interval));
        self
    }

    /// Sizes the search caches (default: 100 pages, 5 minutes).
    #[must_use]
    pub const fn cache(mut self, max_entries: usize, ttl: Duration) -> Self {
        self.cache = Some((max_entries, ttl));
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - neither `api_key` nor `api_token` is set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let credentials = match (self.api_token, self.api_key) {
            (Some(token), _) => Credentials::Bearer(token),
            (None, Some(key)) => Credentials::ApiKey(key),
            (None, None) => bail!("api_key or api_token is required"),
        };
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let (limit, interval) = self.rate_limit.unwrap_or((DEFAULT_LIMIT, DEFAULT_INTERVAL));
        let (max_entries, ttl) = self.cache.unwrap_or((DEFAULT_MAX_ENTRIES, DEFAULT_TTL));

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            credentials,
            language: self
                .language
                .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
            region: self.region.unwrap_or_else(|| String::from(DEFAULT_REGION)),
            rate_limiter: Arc::new(Mutex::new(SlidingWindowLimiter::new(limit, interval))),
            search_cache: Arc::new(SearchCaches::new(max_entries, ttl)),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Response language sent with every request.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Region used to filter watch providers.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Empties every search cache.
    pub fn clear_search_cache(&self) {
        for scope in [SearchScope::Multi, SearchScope::Movie, SearchScope::Tv] {
            self.search_cache.lock(scope).clear();
        }
        tracing::debug!("search caches cleared");
    }

    /// Sends a rate-limited GET request with auth, language, and query params.
    #[instrument(skip_all, fields(path = %path))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.rate_limiter.lock().await.wait_if_needed().await;

        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let mut builder = self
            .http_client
            .get(url)
            .query(&[("language", self.language.as_str())])
            .query(query);
        builder = match self.credentials {
            Credentials::ApiKey(ref key) => builder.query(&[("api_key", key.as_str())]),
            Credentials::Bearer(ref token) => builder.bearer_auth(token),
        };
        let request = builder
            .build()
            .with_context(|| format!("failed to build request: {path}"))?;

        tracing::debug!(?query, "TMDB API request");

        let result = self.http_client.execute(request).await;
        let response = result.with_context(|| format!("request failed: {path}"))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            bail!("TMDB API rate limit exceeded (HTTP 429): {path}");
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            if let Ok(error_response) = serde_json::from_str::<TmdbErrorResponse>(&body) {
                bail!(
                    "TMDB API error (HTTP {}): code={}, message={}",
                    status,
                    error_response.status_code,
                    error_response.status_message,
                );
            }
            bail!("TMDB API error (HTTP {status}): {body}");
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body: {path}"))?;
        let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
        let parsed =
            raw_result.with_context(|| format!("failed to decode JSON response: {path}"))?;
        Ok(parsed)
    }

    /// Runs a search through the cache for `scope`.
    ///
    /// A blank query yields an empty page without a request.
    async fn cached_search<T>(&self, scope: SearchScope, query: &str, page: u32) -> Result<MediaPage>
    where
        T: DeserializeOwned,
        MediaPage: From<TmdbPage<T>>,
    {
        let query = query.trim();
        if query.is_empty() {
            return Ok(MediaPage::empty());
        }

        if let Some(hit) = self.search_cache.lock(scope).get(query, page) {
            tracing::debug!(query, page, "search cache hit");
            return Ok(hit);
        }
        tracing::debug!(query, page, "search cache miss");

        let params = [
            ("query", String::from(query)),
            ("page", page.to_string()),
            ("include_adult", String::from("false")),
        ];
        let raw: TmdbPage<T> = self.get_json(scope.path(), &params).await?;
        let result = MediaPage::from(raw);

        self.search_cache
            .lock(scope)
            .set(query, page, result.clone());
        Ok(result)
    }
}

impl LocalTmdbApi for TmdbClient {
    #[instrument(skip_all)]
    async fn trending(
        &self,
        scope: TrendingScope,
        window: TimeWindow,
        page: u32,
    ) -> Result<MediaPage> {
        let path = format!("trending/{}/{}", scope.as_path(), window.as_path());
        let query = [("page", page.to_string())];
        let page = match scope {
            TrendingScope::All => self
                .get_json::<TmdbPage<TmdbMultiResult>>(&path, &query)
                .await?
                .into(),
            TrendingScope::Movie => self
                .get_json::<TmdbPage<TmdbMovieResult>>(&path, &query)
                .await?
                .into(),
            TrendingScope::Tv => self
                .get_json::<TmdbPage<TmdbTvResult>>(&path, &query)
                .await?
                .into(),
        };
        Ok(page)
    }

    #[instrument(skip_all)]
    async fn movie_list(&self, category: MovieCategory, page: u32) -> Result<MediaPage> {
        let mut query = vec![("page", page.to_string())];
        if matches!(category, MovieCategory::NowPlaying | MovieCategory::Upcoming) {
            query.push(("region", self.region.clone()));
        }
        let raw: TmdbPage<TmdbMovieResult> = self.get_json(category.as_path(), &query).await?;
        Ok(raw.into())
    }

    #[instrument(skip_all)]
    async fn tv_list(&self, category: TvCategory, page: u32) -> Result<MediaPage> {
        let query = [("page", page.to_string())];
        let raw: TmdbPage<TmdbTvResult> = self.get_json(category.as_path(), &query).await?;
        Ok(raw.into())
    }

    #[instrument(skip_all)]
    async fn discover(&self, params: &DiscoverParams) -> Result<MediaPage> {
        let query = params.to_query();
        let page = match params.kind {
            MediaKind::Movie => self
                .get_json::<TmdbPage<TmdbMovieResult>>(params.path(), &query)
                .await?
                .into(),
            MediaKind::Tv => self
                .get_json::<TmdbPage<TmdbTvResult>>(params.path(), &query)
                .await?
                .into(),
        };
        Ok(page)
    }

    #[instrument(skip_all)]
    async fn search_multi(&self, query: &str, page: u32) -> Result<MediaPage> {
        self.cached_search::<TmdbMultiResult>(SearchScope::Multi, query, page)
            .await
    }

    #[instrument(skip_all)]
    async fn search_movie(&self, query: &str, page: u32) -> Result<MediaPage> {
        self.cached_search::<TmdbMovieResult>(SearchScope::Movie, query, page)
            .await
    }

    #[instrument(skip_all)]
    async fn search_tv(&self, query: &str, page: u32) -> Result<MediaPage> {
        self.cached_search::<TmdbTvResult>(SearchScope::Tv, query, page)
            .await
    }

    #[instrument(skip_all)]
    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetails> {
        let path = format!("movie/{movie_id}");
        let query = [("append_to_response", String::from(DETAILS_APPEND))];
        self.get_json(&path, &query).await
    }

    #[instrument(skip_all)]
    async fn tv_details(&self, series_id: u64) -> Result<TvDetails> {
        let path = format!("tv/{series_id}");
        let query = [("append_to_response", String::from(DETAILS_APPEND))];
        self.get_json(&path, &query).await
    }

    #[instrument(skip_all)]
    async fn tv_season(&self, series_id: u64, season_number: u32) -> Result<TvSeason> {
        let path = format!("tv/{series_id}/season/{season_number}");
        self.get_json(&path, &[]).await
    }

    #[instrument(skip_all)]
    async fn recommendations(&self, kind: MediaKind, id: u64, page: u32) -> Result<MediaPage> {
        let path = format!("{kind}/{id}/recommendations");
        let query = [("page", page.to_string())];
        let page = match kind {
            MediaKind::Movie => self
                .get_json::<TmdbPage<TmdbMovieResult>>(&path, &query)
                .await?
                .into(),
            MediaKind::Tv => self
                .get_json::<TmdbPage<TmdbTvResult>>(&path, &query)
                .await?
                .into(),
        };
        Ok(page)
    }

    #[instrument(skip_all)]
    async fn genres(&self, kind: MediaKind) -> Result<Vec<Genre>> {
        let path = format!("genre/{kind}/list");
        let list: TmdbGenreList = self.get_json(&path, &[]).await?;
        Ok(list.genres)
    }

    #[instrument(skip_all)]
    async fn watch_providers(&self, kind: MediaKind, id: u64) -> Result<Option<WatchProviders>> {
        let path = format!("{kind}/{id}/watch/providers");
        let mut response: TmdbWatchProvidersResponse = self.get_json(&path, &[]).await?;
        Ok(response
            .results
            .remove(&self.region)
            .filter(|providers| !providers.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(mock_server: &MockServer) -> TmdbClient {
        let base_url = format!("{}/3/", mock_server.uri());
        TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .rate_limit(1000, Duration::from_millis(1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_credentials() {
        // Arrange & Act
        let result = TmdbClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("api_key or api_token is required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = TmdbClient::builder().api_key("test-key").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_defaults() {
        // Arrange & Act
        let client = TmdbClient::builder()
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.language(), "fr-FR");
        assert_eq!(client.region(), "FR");
        assert_eq!(client.base_url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_token_takes_precedence_over_key() {
        // Arrange & Act
        let client = TmdbClient::builder()
            .api_key("test-key")
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert!(matches!(client.credentials, Credentials::Bearer(_)));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        // Arrange
        let client = TmdbClient::builder()
            .api_key("super-secret")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let debug = format!("{client:?}");

        // Assert
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_search_multi_sends_key_and_language() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_multi_dune.json");

        Mock::given(method("GET"))
            .and(path("/3/search/multi"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("language", "fr-FR"))
            .and(query_param("query", "dune"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let page = client.search_multi("dune", 1).await.unwrap();

        // Assert
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].kind, MediaKind::Movie);
    }

    #[tokio::test]
    async fn test_repeated_search_is_served_from_cache() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_multi_dune.json");

        Mock::given(method("GET"))
            .and(path("/3/search/multi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let first = client.search_multi("dune", 1).await.unwrap();
        let second = client.search_multi("  dune ", 1).await.unwrap();

        // Assert (mock expect(1) verifies a single request)
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_other_page_is_not_cached() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_multi_dune.json");

        Mock::given(method("GET"))
            .and(path("/3/search/multi"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act & Assert (mock expect(2))
        client.search_multi("dune", 1).await.unwrap();
        client.search_multi("dune", 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_search_cache_forces_refetch() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        Mock::given(method("GET"))
            .and(path("/3/search/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        client.search_movie("zzzz", 1).await.unwrap();
        client.clear_search_cache();
        let page = client.search_movie("zzzz", 1).await.unwrap();

        // Assert
        assert!(page.items.is_empty());
        assert_eq!(page.total_results, 0);
    }

    #[tokio::test]
    async fn test_blank_query_skips_request() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let page = client.search_tv("   ", 1).await.unwrap();

        // Assert
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_trending_all_tags_items() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/trending_all_week.json");

        Mock::given(method("GET"))
            .and(path("/3/trending/all/week"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let page = client
            .trending(TrendingScope::All, TimeWindow::Week, 1)
            .await
            .unwrap();

        // Assert
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].kind, MediaKind::Tv);
        assert_eq!(page.items[1].kind, MediaKind::Movie);
    }

    #[tokio::test]
    async fn test_movie_list_now_playing_sends_region() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/movie_popular.json");

        Mock::given(method("GET"))
            .and(path("/3/movie/now_playing"))
            .and(query_param("region", "FR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let page = client
            .movie_list(MovieCategory::NowPlaying, 1)
            .await
            .unwrap();

        // Assert
        assert!(!page.items.is_empty());
    }

    #[tokio::test]
    async fn test_discover_anime_sends_filters() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/discover_tv_anime.json");

        Mock::given(method("GET"))
            .and(path("/3/discover/tv"))
            .and(query_param("with_genres", "16"))
            .and(query_param("with_original_language", "ja"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let page = client
            .discover(&DiscoverParams::anime(MediaKind::Tv))
            .await
            .unwrap();

        // Assert
        assert!(page.items.iter().all(|i| i.kind == MediaKind::Tv));
        assert!(page.items.iter().all(|i| i.genre_ids.contains(&16)));
    }

    #[tokio::test]
    async fn test_movie_details_appends_credits_and_videos() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/movie_details_438631.json");

        Mock::given(method("GET"))
            .and(path("/3/movie/438631"))
            .and(query_param("append_to_response", "credits,videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let details = client.movie_details(438_631).await.unwrap();

        // Assert
        assert_eq!(details.id, 438_631);
        assert_eq!(details.runtime, Some(155));
        assert!(!details.credits.cast.is_empty());
        assert!(details.videos.results[0].watch_url().is_some());
    }

    #[tokio::test]
    async fn test_tv_details_and_season_via_http() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/3/tv/209867"))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/tv_details_209867.json"
            )))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/3/tv/209867/season/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/tv_season_209867_1.json"
            )))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let details = client.tv_details(209_867).await.unwrap();
        let season = client.tv_season(209_867, 1).await.unwrap();

        // Assert
        assert_eq!(details.number_of_seasons, 1);
        assert_eq!(details.seasons[0].season_number, 1);
        assert_eq!(season.season_number, 1);
        assert_eq!(season.episodes[0].episode_number, 1);
    }

    #[tokio::test]
    async fn test_genres_via_http() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/genre_movie_list.json");

        Mock::given(method("GET"))
            .and(path("/3/genre/movie/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let genres = client.genres(MediaKind::Movie).await.unwrap();

        // Assert
        assert!(genres.iter().any(|g| g.id == 16 && g.name == "Animation"));
    }

    #[tokio::test]
    async fn test_watch_providers_filtered_by_region() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/watch_providers_438631.json");

        Mock::given(method("GET"))
            .and(path("/3/movie/438631/watch/providers"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let fr_client = client_for(&mock_server).await;
        let jp_client = TmdbClient::builder()
            .base_url(format!("{}/3/", mock_server.uri()).parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .region("JP")
            .build()
            .unwrap();

        // Act
        let fr = fr_client
            .watch_providers(MediaKind::Movie, 438_631)
            .await
            .unwrap();
        let jp = jp_client
            .watch_providers(MediaKind::Movie, 438_631)
            .await
            .unwrap();

        // Assert
        let fr = fr.unwrap();
        assert_eq!(fr.flatrate[0].provider_name, "Max");
        assert!(!fr.rent.is_empty());
        assert!(jp.is_none());
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer my-secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = TmdbClient::builder()
            .base_url(format!("{}/3/", mock_server.uri()).parse().unwrap())
            .api_token("my-secret-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act & Assert (mock expect(1) verifies Authorization header)
        client.search_movie("test", 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_error_returns_tmdb_error() {
        // Arrange
        let mock_server = MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let result = client.search_multi("test", 1).await;

        // Assert
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("TMDB API error"));
        assert!(err.contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_failed_search_is_not_cached() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let first = client.search_multi("dune", 1).await;
        let second = client.search_multi("dune", 1).await;

        // Assert
        assert!(first.is_err());
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_http_429_is_not_retried() {
        // Arrange
        let mock_server = MockServer::start().await;
        let error_body = r#"{"status_code":25,"status_message":"Your request count is over the allowed limit.","success":false}"#;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string(error_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        // Act
        let result = client.tv_list(TvCategory::Popular, 1).await;

        // Assert
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_rate_limiter_enforces_window() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/genre_movie_list.json");

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = TmdbClient::builder()
            .base_url(format!("{}/3/", mock_server.uri()).parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .rate_limit(2, Duration::from_millis(200))
            .build()
            .unwrap();

        // Act
        let start = std::time::Instant::now();
        client.genres(MediaKind::Movie).await.unwrap();
        client.genres(MediaKind::Movie).await.unwrap();
        client.genres(MediaKind::Movie).await.unwrap();
        let elapsed = start.elapsed();

        // Assert: the third request waits for the first to leave the window
        assert!(elapsed >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_rate_limiter_holds_under_concurrent_clones() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/movie_popular.json");

        Mock::given(method("GET"))
            .and(path("/3/movie/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(5)
            .mount(&mock_server)
            .await;

        let interval = Duration::from_millis(300);
        let client = TmdbClient::builder()
            .base_url(format!("{}/3/", mock_server.uri()).parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .rate_limit(2, interval)
            .build()
            .unwrap();

        let request = |client: TmdbClient| async move {
            client.movie_list(MovieCategory::Popular, 1).await.unwrap();
            std::time::Instant::now()
        };

        // Act
        let (a, b, c, d, e) = tokio::join!(
            request(client.clone()),
            request(client.clone()),
            request(client.clone()),
            request(client.clone()),
            request(client),
        );
        let mut finished = vec![a, b, c, d, e];
        finished.sort();

        // Assert: any three consecutive completions span at least one interval
        let tolerance = Duration::from_millis(50);
        for window in finished.windows(3) {
            let span = window[2].duration_since(window[0]);
            assert!(
                span.saturating_add(tolerance) >= interval,
                "span {span:?} shorter than {interval:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_clones_share_search_cache() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_multi_dune.json");

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let clone = client.clone();

        // Act & Assert (mock expect(1))
        client.search_multi("dune", 1).await.unwrap();
        clone.search_multi("dune", 1).await.unwrap();
    }
}
