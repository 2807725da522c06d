//! `AppConfig` struct and TOML read/write.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use cinescope_api::tmdb::{DEFAULT_INTERVAL, DEFAULT_LIMIT, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB client settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Supabase project settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,
}

/// TMDB client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TmdbConfig {
    /// Response language (e.g. "fr-FR").
    #[serde(default = "default_language")]
    pub language: String,
    /// Region for release dates and watch providers (e.g. "FR").
    #[serde(default = "default_region")]
    pub region: String,
    /// Outbound request limit.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Search cache sizing.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            region: default_region(),
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

fn default_language() -> String {
    String::from("fr-FR")
}

fn default_region() -> String {
    String::from("FR")
}

/// Sliding-window rate limit for TMDB calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Calls admitted per window.
    pub max_requests: usize,
    /// Window length in milliseconds.
    pub interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_LIMIT,
            interval_ms: u64::try_from(DEFAULT_INTERVAL.as_millis()).unwrap_or(1000),
        }
    }
}

impl RateLimitConfig {
    /// Window length.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Search cache sizing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entries kept per search endpoint.
    pub max_entries: usize,
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Supabase project configuration.
///
/// `SUPABASE_URL` and `SUPABASE_ANON_KEY` override these values.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL (e.g. `https://xyz.supabase.co`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Public anon key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

impl SupabaseConfig {
    /// Applies environment overrides.
    #[must_use]
    pub fn with_env_overrides(mut self, url: Option<String>, anon_key: Option<String>) -> Self {
        if url.is_some() {
            self.url = url;
        }
        if anon_key.is_some() {
            self.anon_key = anon_key;
        }
        self
    }

    /// Returns `true` if both the URL and the anon key are set.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.url.is_some() && self.anon_key.is_some()
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert_eq!(config.tmdb.language, "fr-FR");
        assert_eq!(config.tmdb.region, "FR");
        assert_eq!(config.tmdb.rate_limit.max_requests, 40);
        assert_eq!(config.tmdb.rate_limit.interval(), Duration::from_secs(1));
        assert_eq!(config.tmdb.cache.max_entries, 100);
        assert_eq!(config.tmdb.cache.ttl(), Duration::from_secs(300));
        assert!(!config.supabase.is_configured());
    }

    #[test]
    fn test_parse_full_config() {
        // Arrange
        let toml_str = r#"
[tmdb]
language = "en-US"
region = "US"

[tmdb.rate_limit]
max_requests = 20
interval_ms = 500

[tmdb.cache]
max_entries = 10
ttl_secs = 60

[supabase]
url = "https://xyz.supabase.co"
anon_key = "anon"
"#;

        // Act
        let config: AppConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert_eq!(config.tmdb.language, "en-US");
        assert_eq!(config.tmdb.rate_limit.interval(), Duration::from_millis(500));
        assert_eq!(config.tmdb.cache.max_entries, 10);
        assert_eq!(
            config.supabase.url.as_deref(),
            Some("https://xyz.supabase.co")
        );
        assert!(config.supabase.is_configured());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.tmdb.region = String::from("BE");
        config.supabase.anon_key = Some(String::from("anon"));

        // Act
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tmdb]\nregion = \"CA\"\n").unwrap();

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config.tmdb.region, "CA");
        assert_eq!(config.tmdb.language, "fr-FR");
        assert_eq!(config.tmdb.rate_limit, RateLimitConfig::default());
    }

    #[test]
    fn test_load_invalid_toml() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tmdb\n").unwrap();

        // Act
        let result = AppConfig::load(&path);

        // Assert
        assert!(result.unwrap_err().to_string().contains("failed to parse"));
    }

    #[test]
    fn test_env_overrides() {
        // Arrange
        let config = SupabaseConfig {
            url: Some(String::from("https://file.supabase.co")),
            anon_key: None,
        };

        // Act
        let merged = config.with_env_overrides(None, Some(String::from("env-anon")));

        // Assert
        assert_eq!(merged.url.as_deref(), Some("https://file.supabase.co"));
        assert_eq!(merged.anon_key.as_deref(), Some("env-anon"));
    }
}
