//! cinescope - discover movies, TV shows and anime from TMDB.
#![allow(clippy::future_not_send)]

/// Application configuration (TOML).
mod config;
/// Favorites / watched storage.
mod library;
/// User-facing error reporting.
mod report;
/// Persisted Supabase session.
mod session;
/// Terminal UI components.
mod tui;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use cinescope_api::supabase::{LibraryItem, ListKind, LocalAuthApi, SignUpOutcome};
use cinescope_api::tmdb::{
    DiscoverParams, LocalTmdbApi, MAX_PAGE, MediaKind, MediaPage, MovieCategory, SortBy,
    TimeWindow, TmdbClient, TrendingScope, TvCategory, WatchProviders,
};
use cinescope_db::{CachedGenre, genres_fetched_at, load_genres, open_db, save_genres};
use rusqlite::Connection;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, SupabaseConfig, TmdbConfig, resolve_config_path};
use crate::library::{LibraryBackend, build_supabase_client};
use crate::report::{ContentUnavailable, report_error};
use crate::session::SessionStore;
use crate::tui::state::GenreOption;
use crate::tui::{BrowserData, preload_tabs, run_browser};

/// User agent sent to TMDB and Supabase.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Cached genre lists older than this are refetched.
const GENRE_MAX_AGE_DAYS: i64 = 7;

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Trending movies and shows.
    Trending(TrendingArgs),
    /// Curated movie lists.
    Movies(MoviesArgs),
    /// Curated TV show lists.
    Shows(ShowsArgs),
    /// Japanese animation.
    Anime(AnimeArgs),
    /// Discover titles by genre, language, and year.
    Discover(DiscoverArgs),
    /// Search movies and shows.
    Search(SearchArgs),
    /// Movie details.
    Movie(IdArgs),
    /// TV show details.
    Tv(IdArgs),
    /// Episodes of a TV season.
    Season(SeasonArgs),
    /// Titles similar to a movie or show.
    Recommendations(RecommendationsArgs),
    /// Where to stream, rent, or buy a title.
    Providers(MediaArgs),
    /// Official genre list (cached locally).
    Genres(GenresArgs),
    /// Interactive browser.
    Browse,
    /// Supabase account.
    Auth(AuthCommand),
    /// Favorite titles.
    Favorites(ListCommand),
    /// Watched titles.
    Watched(ListCommand),
    /// Configuration file.
    Config(ConfigCommand),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Movie or TV show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Movie.
    Movie,
    /// TV show.
    Tv,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => Self::Movie,
            KindArg::Tv => Self::Tv,
        }
    }
}

/// Media types covered by `trending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum ScopeArg {
    /// Movies and shows.
    #[default]
    All,
    /// Movies only.
    Movie,
    /// Shows only.
    Tv,
}

impl From<ScopeArg> for TrendingScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => Self::All,
            ScopeArg::Movie => Self::Movie,
            ScopeArg::Tv => Self::Tv,
        }
    }
}

/// Trending time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum WindowArg {
    /// Last 24 hours.
    Day,
    /// Last 7 days.
    #[default]
    Week,
}

impl From<WindowArg> for TimeWindow {
    fn from(window: WindowArg) -> Self {
        match window {
            WindowArg::Day => Self::Day,
            WindowArg::Week => Self::Week,
        }
    }
}

/// Curated movie list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum MovieCategoryArg {
    /// Most popular.
    #[default]
    Popular,
    /// Best rated.
    TopRated,
    /// In theaters.
    NowPlaying,
    /// Coming soon.
    Upcoming,
}

impl From<MovieCategoryArg> for MovieCategory {
    fn from(category: MovieCategoryArg) -> Self {
        match category {
            MovieCategoryArg::Popular => Self::Popular,
            MovieCategoryArg::TopRated => Self::TopRated,
            MovieCategoryArg::NowPlaying => Self::NowPlaying,
            MovieCategoryArg::Upcoming => Self::Upcoming,
        }
    }
}

/// Curated TV list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum TvCategoryArg {
    /// Most popular.
    #[default]
    Popular,
    /// Best rated.
    TopRated,
    /// Airing in the next 7 days.
    OnTheAir,
    /// Airing today.
    AiringToday,
}

impl From<TvCategoryArg> for TvCategory {
    fn from(category: TvCategoryArg) -> Self {
        match category {
            TvCategoryArg::Popular => Self::Popular,
            TvCategoryArg::TopRated => Self::TopRated,
            TvCategoryArg::OnTheAir => Self::OnTheAir,
            TvCategoryArg::AiringToday => Self::AiringToday,
        }
    }
}

/// Discover sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum SortArg {
    /// Most popular first.
    #[default]
    Popularity,
    /// Best rated first.
    Rating,
    /// Newest first.
    ReleaseDate,
}

impl From<SortArg> for SortBy {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Popularity => Self::PopularityDesc,
            SortArg::Rating => Self::VoteAverageDesc,
            SortArg::ReleaseDate => Self::ReleaseDateDesc,
        }
    }
}

/// Result page selector.
#[derive(clap::Args)]
struct PageArgs {
    /// Result page (1-based).
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGE)),
    )]
    page: u32,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Media types to include.
    #[arg(long, value_enum, default_value_t)]
    scope: ScopeArg,

    /// Time window.
    #[arg(long, value_enum, default_value_t)]
    window: WindowArg,

    #[command(flatten)]
    page: PageArgs,
}

/// Arguments for the `movies` subcommand.
#[derive(clap::Args)]
struct MoviesArgs {
    /// List to show.
    #[arg(long, value_enum, default_value_t)]
    category: MovieCategoryArg,

    #[command(flatten)]
    page: PageArgs,
}

/// Arguments for the `shows` subcommand.
#[derive(clap::Args)]
struct ShowsArgs {
    /// List to show.
    #[arg(long, value_enum, default_value_t)]
    category: TvCategoryArg,

    #[command(flatten)]
    page: PageArgs,
}

/// Arguments for the `anime` subcommand.
#[derive(clap::Args)]
struct AnimeArgs {
    /// Series or films.
    #[arg(long, value_enum, default_value = "tv")]
    kind: KindArg,

    #[command(flatten)]
    page: PageArgs,
}

/// Arguments for the `discover` subcommand.
#[derive(clap::Args)]
struct DiscoverArgs {
    /// Movies or shows.
    #[arg(long, value_enum)]
    kind: KindArg,

    /// Required genre IDs (comma-separated; see `genres`).
    #[arg(long, value_delimiter = ',')]
    genre: Vec<u32>,

    /// Sort order.
    #[arg(long, value_enum, default_value_t)]
    sort: SortArg,

    /// Original language (ISO 639-1, e.g. "ja").
    #[arg(long)]
    language: Option<String>,

    /// Release or first air year.
    #[arg(long)]
    year: Option<u32>,

    /// Minimum vote count.
    #[arg(long)]
    min_votes: Option<u32>,

    #[command(flatten)]
    page: PageArgs,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query.
    query: String,

    /// Restrict to movies or shows.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    #[command(flatten)]
    page: PageArgs,
}

/// Arguments for the `movie` and `tv` subcommands.
#[derive(clap::Args)]
struct IdArgs {
    /// TMDB ID.
    id: u64,
}

/// Arguments for the `season` subcommand.
#[derive(clap::Args)]
struct SeasonArgs {
    /// TMDB series ID.
    id: u64,

    /// Season number.
    season: u32,
}

/// A title identified by kind and TMDB ID.
#[derive(clap::Args)]
struct MediaArgs {
    /// Movie or show.
    #[arg(value_enum)]
    kind: KindArg,

    /// TMDB ID.
    id: u64,
}

/// Arguments for the `recommendations` subcommand.
#[derive(clap::Args)]
struct RecommendationsArgs {
    #[command(flatten)]
    media: MediaArgs,

    #[command(flatten)]
    page: PageArgs,
}

/// Arguments for the `genres` subcommand.
#[derive(clap::Args)]
struct GenresArgs {
    /// Movie or TV genres.
    #[arg(value_enum)]
    kind: KindArg,

    /// Refetch from TMDB even if the local copy is fresh.
    #[arg(long)]
    refresh: bool,
}

/// Arguments for the `auth` subcommand.
#[derive(clap::Args)]
struct AuthCommand {
    /// Auth subcommand to run.
    #[command(subcommand)]
    command: AuthSubcommands,
}

/// Available auth subcommands.
#[derive(Subcommand)]
enum AuthSubcommands {
    /// Create an account.
    SignUp(CredentialsArgs),
    /// Sign in and store the session.
    SignIn(CredentialsArgs),
    /// Revoke and delete the stored session.
    SignOut,
    /// Show the stored session.
    Status,
}

/// Email and password.
#[derive(clap::Args)]
struct CredentialsArgs {
    /// Account email.
    #[arg(long)]
    email: String,

    /// Account password.
    #[arg(long, env = "CINESCOPE_PASSWORD", hide_env_values = true)]
    password: String,
}

/// Arguments for the `favorites` and `watched` subcommands.
#[derive(clap::Args)]
struct ListCommand {
    /// List subcommand to run.
    #[command(subcommand)]
    command: ListSubcommands,
}

/// Available list subcommands.
#[derive(Subcommand)]
enum ListSubcommands {
    /// Add a title.
    Add(MediaArgs),
    /// Remove a title.
    Remove(MediaArgs),
    /// Check whether a title is in the list.
    Check(MediaArgs),
    /// List titles, newest first.
    List,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective configuration.
    Show,
    /// Write a default `config.toml`.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: clap_complete::Shell,
}

/// Loaded configuration and directory override shared by the commands.
struct AppContext {
    dir: Option<PathBuf>,
    config: AppConfig,
}

impl AppContext {
    /// Loads `config.toml` and applies `SUPABASE_URL` / `SUPABASE_ANON_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config path cannot be resolved or the file is invalid.
    fn load(dir: Option<PathBuf>) -> Result<Self> {
        let path = resolve_config_path(dir.as_ref())?;
        let mut config = AppConfig::load(&path)?;
        config.supabase = config.supabase.with_env_overrides(
            std::env::var("SUPABASE_URL").ok(),
            std::env::var("SUPABASE_ANON_KEY").ok(),
        );
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(Self { dir, config })
    }

    const fn dir(&self) -> Option<&PathBuf> {
        self.dir.as_ref()
    }

    fn tmdb_client(&self) -> Result<TmdbClient> {
        build_tmdb_client(&self.config.tmdb)
    }

    const fn supabase(&self) -> &SupabaseConfig {
        &self.config.supabase
    }
}

/// Builds a `TmdbClient` from config and the `TMDB_*` environment variables.
///
/// # Errors
///
/// Returns an error if neither `TMDB_API_TOKEN` nor `TMDB_API_KEY` is set,
/// `TMDB_BASE_URL` is invalid, or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(config: &TmdbConfig) -> Result<TmdbClient> {
    let token = std::env::var("TMDB_API_TOKEN").ok();
    let key = std::env::var("TMDB_API_KEY").ok();
    if token.is_none() && key.is_none() {
        bail!("TMDB_API_TOKEN or TMDB_API_KEY environment variable is required");
    }

    let mut builder = TmdbClient::builder()
        .user_agent(USER_AGENT)
        .language(&config.language)
        .region(&config.region)
        .rate_limit(config.rate_limit.max_requests, config.rate_limit.interval())
        .cache(config.cache.max_entries, config.cache.ttl());
    if let Some(token) = token {
        builder = builder.api_token(token);
    }
    if let Some(key) = key {
        builder = builder.api_key(key);
    }
    if let Ok(base_url) = std::env::var("TMDB_BASE_URL") {
        let url = url::Url::parse(&base_url)
            .with_context(|| format!("invalid TMDB_BASE_URL: {base_url}"))?;
        builder = builder.base_url(url);
    }

    builder.build().context("failed to build TMDB client")
}

// --- Output ---

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Logs a result page as tab-separated rows.
fn print_page(page: &MediaPage) {
    tracing::info!(
        "Page {}/{} ({} results)",
        page.page,
        page.total_pages.max(1),
        page.total_results
    );
    tracing::info!("Type\tID\tYear\tRating\tTitle");
    for item in &page.items {
        tracing::info!(
            "{}\t{}\t{}\t{:.1}\t{}",
            item.kind,
            item.id,
            item.year().map_or_else(|| String::from("-"), |y| y.to_string()),
            item.vote_average,
            item.title,
        );
    }
}

fn print_providers(providers: &WatchProviders) {
    for (label, list) in [
        ("Stream", &providers.flatrate),
        ("Rent", &providers.rent),
        ("Buy", &providers.buy),
    ] {
        if list.is_empty() {
            continue;
        }
        let names: Vec<&str> = list.iter().map(|p| p.provider_name.as_str()).collect();
        tracing::info!("{label}: {}", names.join(", "));
    }
    if let Some(link) = &providers.link {
        tracing::info!("More: {link}");
    }
}

// --- TMDB commands ---

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_trending(args: &TrendingArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let page = client
        .trending(args.scope.into(), args.window.into(), args.page.page)
        .await
        .context(ContentUnavailable)?;
    print_page(&page);
    Ok(())
}

/// Runs the `movies` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_movies(args: &MoviesArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let page = client
        .movie_list(args.category.into(), args.page.page)
        .await
        .context(ContentUnavailable)?;
    print_page(&page);
    Ok(())
}

/// Runs the `shows` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_shows(args: &ShowsArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let page = client
        .tv_list(args.category.into(), args.page.page)
        .await
        .context(ContentUnavailable)?;
    print_page(&page);
    Ok(())
}

/// Runs the `anime` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_anime(args: &AnimeArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let params = DiscoverParams::anime(args.kind.into()).page(args.page.page);
    let page = client.discover(&params).await.context(ContentUnavailable)?;
    print_page(&page);
    Ok(())
}

/// Runs the `discover` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_discover(args: &DiscoverArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;

    let mut params = DiscoverParams::new(args.kind.into())
        .sort_by(args.sort.into())
        .page(args.page.page);
    for genre_id in &args.genre {
        params = params.genre(*genre_id);
    }
    if let Some(ref language) = args.language {
        params = params.original_language(language);
    }
    if let Some(year) = args.year {
        params = params.year(year);
    }
    if let Some(count) = args.min_votes {
        params = params.min_vote_count(count);
    }

    let page = client.discover(&params).await.context(ContentUnavailable)?;
    print_page(&page);
    Ok(())
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let query = args.query.trim();
    if query.is_empty() {
        bail!("search query must not be blank");
    }

    let page = match args.kind {
        None => client.search_multi(query, args.page.page).await,
        Some(KindArg::Movie) => client.search_movie(query, args.page.page).await,
        Some(KindArg::Tv) => client.search_tv(query, args.page.page).await,
    }
    .context(ContentUnavailable)?;

    if page.items.is_empty() {
        tracing::info!("No results for \"{query}\"");
        return Ok(());
    }
    print_page(&page);
    Ok(())
}

/// Runs the `movie` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_movie(args: &IdArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let details = client
        .movie_details(args.id)
        .await
        .context(ContentUnavailable)?;

    tracing::info!("ID: {}", details.id);
    tracing::info!("Title: {}", details.title);
    tracing::info!(
        "Original Title: {}",
        or_dash(details.original_title.as_deref())
    );
    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        tracing::info!("Tagline: {tagline}");
    }
    tracing::info!(
        "Release Date: {}",
        or_dash(details.release_date.as_deref())
    );
    tracing::info!(
        "Runtime: {}",
        details
            .runtime
            .map_or_else(|| String::from("-"), |r| format!("{r} min"))
    );
    tracing::info!("Status: {}", or_dash(details.status.as_deref()));
    let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
    tracing::info!("Genres: {}", genres.join(", "));
    tracing::info!(
        "Rating: {:.1} ({} votes)",
        details.vote_average,
        details.vote_count
    );
    tracing::info!("Overview: {}", or_dash(details.overview.as_deref()));
    tracing::info!("---");
    for member in details.credits.cast.iter().take(5) {
        tracing::info!(
            "  {} as {}",
            member.name,
            or_dash(member.character.as_deref())
        );
    }
    if let Some(url) = details.videos.results.iter().find_map(|v| {
        if v.video_type == "Trailer" {
            v.watch_url()
        } else {
            None
        }
    }) {
        tracing::info!("Trailer: {url}");
    }

    Ok(())
}

/// Runs the `tv` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_tv(args: &IdArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let details = client
        .tv_details(args.id)
        .await
        .context(ContentUnavailable)?;

    tracing::info!("ID: {}", details.id);
    tracing::info!("Name: {}", details.name);
    tracing::info!(
        "Original Name: {}",
        or_dash(details.original_name.as_deref())
    );
    tracing::info!(
        "First Air Date: {}",
        or_dash(details.first_air_date.as_deref())
    );
    tracing::info!("Status: {}", or_dash(details.status.as_deref()));
    let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
    tracing::info!("Genres: {}", genres.join(", "));
    tracing::info!("Seasons: {}", details.number_of_seasons);
    tracing::info!("Episodes: {}", details.number_of_episodes);
    tracing::info!("Overview: {}", or_dash(details.overview.as_deref()));
    tracing::info!("---");
    for season in &details.seasons {
        tracing::info!(
            "  Season {}: {} episodes (air_date: {})",
            season.season_number,
            season.episode_count,
            or_dash(season.air_date.as_deref()),
        );
    }

    Ok(())
}

/// Runs the `season` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_season(args: &SeasonArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let season = client
        .tv_season(args.id, args.season)
        .await
        .context(ContentUnavailable)?;

    tracing::info!(
        "Season {}: {}",
        season.season_number,
        or_dash(season.name.as_deref())
    );
    tracing::info!("Episodes:");
    for ep in &season.episodes {
        tracing::info!(
            "  E{:02}: {} (air_date: {}, runtime: {}min)",
            ep.episode_number,
            ep.name,
            or_dash(ep.air_date.as_deref()),
            ep.runtime
                .map_or_else(|| String::from("-"), |r| r.to_string()),
        );
    }

    Ok(())
}

/// Runs the `recommendations` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_recommendations(args: &RecommendationsArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let page = client
        .recommendations(args.media.kind.into(), args.media.id, args.page.page)
        .await
        .context(ContentUnavailable)?;
    print_page(&page);
    Ok(())
}

/// Runs the `providers` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_providers(args: &MediaArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let providers = client
        .watch_providers(args.kind.into(), args.id)
        .await
        .context(ContentUnavailable)?;

    match providers {
        Some(providers) => print_providers(&providers),
        None => tracing::info!(
            "No streaming offer in region {} for {} {}",
            client.region(),
            MediaKind::from(args.kind),
            args.id
        ),
    }
    Ok(())
}

/// Returns cached genres, refetching from TMDB when missing, stale, or forced.
///
/// # Errors
///
/// Returns an error if the database or the API request fails.
async fn load_or_fetch_genres(
    conn: &Connection,
    client: &TmdbClient,
    kind: MediaKind,
    refresh: bool,
) -> Result<Vec<CachedGenre>> {
    let kind_str = kind.as_str();
    if !refresh && is_fresh(genres_fetched_at(conn, kind_str)?, Utc::now()) {
        let cached = load_genres(conn, kind_str)?;
        if !cached.is_empty() {
            tracing::debug!(kind = kind_str, count = cached.len(), "Genre cache hit");
            return Ok(cached);
        }
    }

    let fetched = client.genres(kind).await.context(ContentUnavailable)?;
    let genres: Vec<CachedGenre> = fetched
        .into_iter()
        .map(|g| CachedGenre {
            id: g.id,
            name: g.name,
        })
        .collect();
    save_genres(conn, kind_str, &genres).context("failed to save genres")?;
    tracing::debug!(kind = kind_str, count = genres.len(), "Genre cache refreshed");
    load_genres(conn, kind_str)
}

/// Returns `true` if a genre list fetched at `fetched_at` is still usable at `now`.
fn is_fresh(fetched_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    fetched_at.is_some_and(|at| {
        now.signed_duration_since(at) < TimeDelta::days(GENRE_MAX_AGE_DAYS)
    })
}

/// Runs the `genres` subcommand.
///
/// # Errors
///
/// Returns an error if the database or the API request fails.
#[instrument(skip_all)]
async fn run_genres(args: &GenresArgs, ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let conn = open_db(ctx.dir()).context("failed to open database")?;
    let genres = load_or_fetch_genres(&conn, &client, args.kind.into(), args.refresh).await?;

    tracing::info!("ID\tName");
    for genre in &genres {
        tracing::info!("{}\t{}", genre.id, genre.name);
    }
    Ok(())
}

/// Merges movie and TV genres for the browser panel, sorted by name.
fn merge_genres(movie: Vec<CachedGenre>, tv: Vec<CachedGenre>) -> Vec<GenreOption> {
    let by_id: BTreeMap<u32, String> = movie
        .into_iter()
        .chain(tv)
        .map(|g| (g.id, g.name))
        .collect();
    let mut genres: Vec<GenreOption> = by_id
        .into_iter()
        .map(|(id, name)| GenreOption { id, name })
        .collect();
    genres.sort_by_key(|g| crate::tui::state::fold(&g.name));
    genres
}

/// Loads genres and the first tab pages, then launches the browser.
///
/// # Errors
///
/// Returns an error if loading or the TUI fails.
#[instrument(skip_all)]
async fn run_browse(ctx: &AppContext) -> Result<()> {
    let client = ctx.tmdb_client()?;
    let library = LibraryBackend::open(ctx.supabase(), ctx.dir())?;
    let conn = open_db(ctx.dir()).context("failed to open database")?;

    let movie_genres = load_or_fetch_genres(&conn, &client, MediaKind::Movie, false).await?;
    let tv_genres = load_or_fetch_genres(&conn, &client, MediaKind::Tv, false).await?;
    let (movies, shows, anime) = preload_tabs(&client).await.context(ContentUnavailable)?;

    tracing::info!(
        "Loaded {} movies, {} shows, {} anime. Launching TUI...",
        movies.items.len(),
        shows.items.len(),
        anime.items.len()
    );

    let data = BrowserData {
        movies,
        shows,
        anime,
        genres: merge_genres(movie_genres, tv_genres),
    };
    run_browser(&client, &library, data)
        .await
        .context("browser TUI failed")
}

// --- Auth commands ---

/// Runs the `auth sign-up` subcommand.
///
/// # Errors
///
/// Returns an error if Supabase is not configured or rejects the sign-up.
#[instrument(skip_all)]
async fn run_sign_up(args: &CredentialsArgs, ctx: &AppContext) -> Result<()> {
    let client = build_supabase_client(ctx.supabase())?;
    match client.sign_up(&args.email, &args.password).await? {
        SignUpOutcome::Session(session) => {
            SessionStore::new(ctx.dir())?.save(&session)?;
            tracing::info!("Account created. Signed in as {}", session.display_name());
        }
        SignUpOutcome::ConfirmationRequired(_) => {
            tracing::info!(
                "Account created. Confirm the email sent to {} then run `auth sign-in`.",
                args.email
            );
        }
    }
    Ok(())
}

/// Runs the `auth sign-in` subcommand.
///
/// # Errors
///
/// Returns an error if Supabase is not configured or rejects the credentials.
#[instrument(skip_all)]
async fn run_sign_in(args: &CredentialsArgs, ctx: &AppContext) -> Result<()> {
    let client = build_supabase_client(ctx.supabase())?;
    let session = client.sign_in(&args.email, &args.password).await?;
    SessionStore::new(ctx.dir())?.save(&session)?;
    tracing::info!("Signed in as {}", session.display_name());
    Ok(())
}

/// Runs the `auth sign-out` subcommand.
///
/// The local session is deleted even if the server rejects the logout.
///
/// # Errors
///
/// Returns an error if the session file cannot be read or removed.
#[instrument(skip_all)]
async fn run_sign_out(ctx: &AppContext) -> Result<()> {
    let store = SessionStore::new(ctx.dir())?;
    let Some(session) = store.load()? else {
        tracing::info!("Not signed in");
        return Ok(());
    };

    match build_supabase_client(ctx.supabase()) {
        Ok(client) => {
            if let Err(err) = client.sign_out(&session).await {
                tracing::warn!("Server sign-out failed: {err:#}");
            }
        }
        Err(err) => tracing::warn!("Skipping server sign-out: {err:#}"),
    }

    store.clear()?;
    tracing::info!("Signed out {}", session.display_name());
    Ok(())
}

/// Runs the `auth status` subcommand.
///
/// # Errors
///
/// Returns an error if the session file cannot be read.
#[instrument(skip_all)]
fn run_auth_status(ctx: &AppContext) -> Result<()> {
    let store = SessionStore::new(ctx.dir())?;
    let Some(session) = store.load()? else {
        tracing::info!("Not signed in. Favorites and watched titles are stored locally.");
        return Ok(());
    };
    tracing::debug!(path = %store.path().display(), "Session loaded");

    let expires = session
        .expires_at
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map_or_else(|| String::from("-"), |at| at.to_rfc3339());
    if session.is_expired_at(Utc::now()) {
        tracing::info!(
            "Session for {} expired at {expires}. Run `auth sign-in` again.",
            session.display_name()
        );
    } else {
        tracing::info!(
            "Signed in as {} (expires at {expires})",
            session.display_name()
        );
    }
    Ok(())
}

// --- Library commands ---

/// Fetches the title and poster of a movie or show for a list row.
///
/// # Errors
///
/// Returns an error if the API request fails.
async fn lookup_item(client: &TmdbClient, kind: MediaKind, id: u64) -> Result<LibraryItem> {
    let item = match kind {
        MediaKind::Movie => {
            let details = client.movie_details(id).await.context(ContentUnavailable)?;
            LibraryItem {
                media_id: details.id,
                media_type: kind,
                title: details.title,
                poster_path: details.poster_path,
            }
        }
        MediaKind::Tv => {
            let details = client.tv_details(id).await.context(ContentUnavailable)?;
            LibraryItem {
                media_id: details.id,
                media_type: kind,
                title: details.name,
                poster_path: details.poster_path,
            }
        }
    };
    Ok(item)
}

/// Runs the `favorites` / `watched` subcommands.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened or the operation fails.
#[instrument(skip_all, fields(list = list.table()))]
async fn run_list_command(
    list: ListKind,
    command: &ListSubcommands,
    ctx: &AppContext,
) -> Result<()> {
    let library = LibraryBackend::open(ctx.supabase(), ctx.dir())?;

    match command {
        ListSubcommands::Add(args) => {
            let client = ctx.tmdb_client()?;
            let item = lookup_item(&client, args.kind.into(), args.id).await?;
            if library.add(list, &item).await? {
                tracing::info!("Added \"{}\" to {}", item.title, list.table());
            } else {
                tracing::info!("\"{}\" is already in {}", item.title, list.table());
            }
        }
        ListSubcommands::Remove(args) => {
            let kind = MediaKind::from(args.kind);
            if library.remove(list, args.id, kind).await? {
                tracing::info!("Removed {kind} {} from {}", args.id, list.table());
            } else {
                tracing::info!("{kind} {} is not in {}", args.id, list.table());
            }
        }
        ListSubcommands::Check(args) => {
            let kind = MediaKind::from(args.kind);
            let present = library.contains(list, args.id, kind).await?;
            tracing::info!(
                "{kind} {} {} in {}",
                args.id,
                if present { "is" } else { "is not" },
                list.table()
            );
        }
        ListSubcommands::List => {
            let entries = library.list(list).await?;
            tracing::info!(
                "{} ({}): {} titles",
                list.table(),
                library.label(),
                entries.len()
            );
            if entries.is_empty() {
                return Ok(());
            }
            tracing::info!("Type\tID\tAdded\t\tTitle");
            for entry in &entries {
                tracing::info!(
                    "{}\t{}\t{}\t{}",
                    entry.media_type,
                    entry.media_id,
                    entry.created_at.format("%Y-%m-%d"),
                    entry.title,
                );
            }
        }
    }
    Ok(())
}

/// Runs the `config` subcommands.
///
/// # Errors
///
/// Returns an error if the config path cannot be resolved or the file cannot be written.
#[instrument(skip_all)]
fn run_config(command: &ConfigSubcommands, ctx: &AppContext) -> Result<()> {
    let path = resolve_config_path(ctx.dir())?;
    match command {
        ConfigSubcommands::Show => {
            let tmdb = &ctx.config.tmdb;
            tracing::info!("Config file: {}", path.display());
            tracing::info!("Language: {}", tmdb.language);
            tracing::info!("Region: {}", tmdb.region);
            tracing::info!(
                "Rate limit: {} requests / {} ms",
                tmdb.rate_limit.max_requests,
                tmdb.rate_limit.interval_ms
            );
            tracing::info!(
                "Search cache: {} entries, {} s",
                tmdb.cache.max_entries,
                tmdb.cache.ttl_secs
            );
            let supabase = ctx.supabase();
            if supabase.is_configured() {
                tracing::info!("Supabase: {}", or_dash(supabase.url.as_deref()));
            } else {
                tracing::info!("Supabase: not configured (library stored locally)");
            }
        }
        ConfigSubcommands::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            AppConfig::default().save(&path)?;
            tracing::info!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Writes shell completions to stdout.
fn run_completions(args: &CompletionsArgs) {
    clap_complete::generate(
        args.shell,
        &mut Cli::command(),
        env!("CARGO_BIN_NAME"),
        &mut std::io::stdout(),
    );
}

/// Dispatches the parsed subcommand.
///
/// # Errors
///
/// Returns an error if the subcommand fails.
async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions(args) = &cli.command {
        run_completions(args);
        return Ok(());
    }

    let ctx = AppContext::load(cli.dir)?;
    match cli.command {
        Commands::Trending(args) => run_trending(&args, &ctx).await,
        Commands::Movies(args) => run_movies(&args, &ctx).await,
        Commands::Shows(args) => run_shows(&args, &ctx).await,
        Commands::Anime(args) => run_anime(&args, &ctx).await,
        Commands::Discover(args) => run_discover(&args, &ctx).await,
        Commands::Search(args) => run_search(&args, &ctx).await,
        Commands::Movie(args) => run_movie(&args, &ctx).await,
        Commands::Tv(args) => run_tv(&args, &ctx).await,
        Commands::Season(args) => run_season(&args, &ctx).await,
        Commands::Recommendations(args) => run_recommendations(&args, &ctx).await,
        Commands::Providers(args) => run_providers(&args, &ctx).await,
        Commands::Genres(args) => run_genres(&args, &ctx).await,
        Commands::Browse => run_browse(&ctx).await,
        Commands::Auth(auth) => match auth.command {
            AuthSubcommands::SignUp(args) => run_sign_up(&args, &ctx).await,
            AuthSubcommands::SignIn(args) => run_sign_in(&args, &ctx).await,
            AuthSubcommands::SignOut => run_sign_out(&ctx).await,
            AuthSubcommands::Status => run_auth_status(&ctx),
        },
        Commands::Favorites(cmd) => {
            run_list_command(ListKind::Favorites, &cmd.command, &ctx).await
        }
        Commands::Watched(cmd) => {
            run_list_command(ListKind::Watched, &cmd.command, &ctx).await
        }
        Commands::Config(cmd) => run_config(&cmd.command, &ctx),
        Commands::Completions(_) => Ok(()),
    }
}

/// Entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]

    use super::*;

    fn genre(id: u32, name: &str) -> CachedGenre {
        CachedGenre {
            id,
            name: String::from(name),
        }
    }

    #[test]
    fn test_cli_definition() {
        // Arrange & Act & Assert
        Cli::command().debug_assert();
    }

    #[test]
    fn test_is_fresh() {
        // Arrange
        let now = Utc::now();

        // Act & Assert
        assert!(!is_fresh(None, now));
        assert!(is_fresh(Some(now - TimeDelta::days(6)), now));
        assert!(!is_fresh(Some(now - TimeDelta::days(7)), now));
    }

    #[test]
    fn test_merge_genres_dedups_and_sorts() {
        // Arrange
        let movie = vec![genre(28, "Action"), genre(16, "Animation"), genre(18, "Drame")];
        let tv = vec![
            genre(16, "Animation"),
            genre(10_759, "Action & Aventure"),
            genre(99, "Documentaire"),
        ];

        // Act
        let merged = merge_genres(movie, tv);

        // Assert
        let names: Vec<&str> = merged.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            names,
            ["Action", "Action & Aventure", "Animation", "Documentaire", "Drame"]
        );
    }

    #[test]
    fn test_or_dash() {
        // Arrange & Act & Assert
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("2024")), "2024");
    }

    #[test]
    fn test_parse_discover_args() {
        // Arrange & Act
        let cli = Cli::try_parse_from([
            "cinescope",
            "discover",
            "--kind",
            "tv",
            "--genre",
            "16,10765",
            "--sort",
            "rating",
            "--language",
            "ja",
            "--page",
            "2",
        ])
        .unwrap();

        // Assert
        let Commands::Discover(args) = cli.command else {
            panic!("expected discover");
        };
        assert_eq!(args.kind, KindArg::Tv);
        assert_eq!(args.genre, [16, 10_765]);
        assert_eq!(args.sort, SortArg::Rating);
        assert_eq!(args.page.page, 2);
    }

    #[test]
    fn test_page_out_of_range() {
        // Arrange & Act
        let result = Cli::try_parse_from(["cinescope", "trending", "--page", "0"]);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_category_names_are_kebab_case() {
        // Arrange & Act
        let cli = Cli::try_parse_from(["cinescope", "shows", "--category", "on-the-air"]).unwrap();

        // Assert
        let Commands::Shows(args) = cli.command else {
            panic!("expected shows");
        };
        assert_eq!(TvCategory::from(args.category), TvCategory::OnTheAir);
    }
}
