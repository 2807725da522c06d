//! Persisted Supabase session (`session.json` in the data directory).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cinescope_api::supabase::Session;

use crate::config::resolve_data_dir;

/// Session file name.
const SESSION_FILE_NAME: &str = "session.json";

/// JSON file holding the signed-in session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store under the data directory (`--dir` or `~/.local/share/cinescope`).
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be resolved.
    pub fn new(dir: Option<&PathBuf>) -> Result<Self> {
        Ok(Self::at(resolve_data_dir(dir)?.join(SESSION_FILE_NAME)))
    }

    /// Creates a store at an explicit path.
    #[must_use]
    pub const fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(session))
    }

    /// Writes the session, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation, serialization, or file write fails.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content =
            serde_json::to_string_pretty(session).context("failed to serialize session")?;
        write_private(&self.path, content.as_bytes())
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Deletes the session file. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}

/// Writes `content` to `path`, readable by the owner only on unix.
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let mut file = options.open(path)?;
        // mode() only applies on creation
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file.write_all(content)
    }
    #[cfg(not(unix))]
    {
        options.open(path)?.write_all(content)
    }
}
