//! User-facing error reporting.

use std::fmt;

use cinescope_api::supabase::AuthError;

/// Generic message shown when TMDB content cannot be loaded.
pub const LOAD_ERROR_MESSAGE: &str = "Impossible de charger le contenu. Réessayez plus tard.";

/// Context marker attached to failed content loads.
///
/// `report_error` replaces the technical chain with [`LOAD_ERROR_MESSAGE`]
/// when this marker is present.
#[derive(Debug, Clone, Copy)]
pub struct ContentUnavailable;

impl fmt::Display for ContentUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(LOAD_ERROR_MESSAGE)
    }
}

/// Message to show the user for a failure.
#[must_use]
pub fn user_message(err: &anyhow::Error) -> String {
    if let Some(auth) = err.downcast_ref::<AuthError>() {
        String::from(auth.user_message())
    } else if err.downcast_ref::<ContentUnavailable>().is_some() {
        String::from(LOAD_ERROR_MESSAGE)
    } else {
        format!("{err:#}")
    }
}

/// Logs a command failure.
///
/// Auth failures use their French user message, content load failures use
/// [`LOAD_ERROR_MESSAGE`], and anything else is logged with its full chain.
pub fn report_error(err: &anyhow::Error) {
    if let Some(auth) = err.downcast_ref::<AuthError>() {
        tracing::error!(cause = %auth, "{}", auth.user_message());
    } else if err.downcast_ref::<ContentUnavailable>().is_some() {
        tracing::error!(cause = %err.root_cause(), "{LOAD_ERROR_MESSAGE}");
    } else {
        tracing::error!("{err:#}");
    }
}
