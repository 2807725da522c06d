//! Application configuration module.
//!
//! Manages the TOML config file (TMDB locale, rate limit and cache sizing,
//! Supabase project) and the config/data directory layout.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, SupabaseConfig, TmdbConfig};
pub use paths::{resolve_config_path, resolve_data_dir};
