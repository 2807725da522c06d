//! Supabase auth and row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tmdb::{MediaItem, MediaKind};

// --- Auth ---

/// Authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User UUID.
    pub id: String,
    /// Email address.
    pub email: Option<String>,
    /// Email confirmation timestamp.
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
    /// Account creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Session returned by sign-in or an auto-confirmed sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// JWT used as bearer token for auth and REST calls.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: i64,
    /// Expiry as a Unix timestamp.
    pub expires_at: Option<i64>,
    /// Signed-in user.
    pub user: User,
}

impl Session {
    /// Returns `true` if the access token has expired at `now`.
    ///
    /// Sessions without an expiry are considered valid.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now.timestamp() >= expires_at)
    }

    /// Email of the signed-in user, or its id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user.email.as_deref().unwrap_or(&self.user.id)
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The project auto-confirms accounts; the user is signed in.
    Session(Session),
    /// A confirmation email was sent.
    ConfirmationRequired(User),
}

/// Raw sign-up response: a session, or a bare user when confirmation is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpResponse {
    Session(Session),
    User(User),
}

impl From<SignUpResponse> for SignUpOutcome {
    fn from(response: SignUpResponse) -> Self {
        match response {
            SignUpResponse::Session(session) => Self::Session(session),
            SignUpResponse::User(user) => Self::ConfirmationRequired(user),
        }
    }
}

/// Error body shared by `GoTrue` and `PostgREST`.
///
/// `GoTrue` uses `error_code`/`msg` (or `error`/`error_description` on older
/// versions); `PostgREST` uses `code`/`message`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error_code: Option<String>,
    pub code: Option<serde_json::Value>,
    pub msg: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl ErrorBody {
    /// Machine-readable code, if any.
    pub fn code(&self) -> Option<&str> {
        self.error_code
            .as_deref()
            .or_else(|| self.code.as_ref().and_then(serde_json::Value::as_str))
            .or(self.error.as_deref())
    }

    /// Human-readable message, if any.
    pub fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.message.as_deref())
    }
}

// --- Rows ---

/// Personal list backed by a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// `favorites` table.
    Favorites,
    /// `watched` table.
    Watched,
}

impl ListKind {
    /// Table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::Watched => "watched",
        }
    }
}

/// Title to add to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryItem {
    /// TMDB ID.
    pub media_id: u64,
    /// Movie or show.
    pub media_type: MediaKind,
    /// Title at the time it was added.
    pub title: String,
    /// Poster image path.
    pub poster_path: Option<String>,
}

impl From<&MediaItem> for LibraryItem {
    fn from(item: &MediaItem) -> Self {
        Self {
            media_id: item.id,
            media_type: item.kind,
            title: item.title.clone(),
            poster_path: item.poster_path.clone(),
        }
    }
}

/// Row inserted into a list table.
#[derive(Debug, Serialize)]
pub(crate) struct NewRow<'a> {
    pub user_id: &'a str,
    #[serde(flatten)]
    pub item: &'a LibraryItem,
}

/// Row of a list table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryEntry {
    /// Owner UUID.
    pub user_id: String,
    /// TMDB ID.
    pub media_id: u64,
    /// Movie or show.
    pub media_type: MediaKind,
    /// Title at the time it was added.
    pub title: String,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    #![allow(clippy::arithmetic_side_effects)]

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_sign_up_response_with_session() {
        // Arrange
        let json = include_str!("../../../../fixtures/supabase/session.json");

        // Act
        let outcome = SignUpOutcome::from(serde_json::from_str::<SignUpResponse>(json).unwrap());

        // Assert
        assert!(matches!(outcome, SignUpOutcome::Session(_)));
    }

    #[test]
    fn test_sign_up_response_with_user_only() {
        // Arrange
        let json = include_str!("../../../../fixtures/supabase/user.json");

        // Act
        let outcome = SignUpOutcome::from(serde_json::from_str::<SignUpResponse>(json).unwrap());

        // Assert
        let SignUpOutcome::ConfirmationRequired(user) = outcome else {
            panic!("expected ConfirmationRequired");
        };
        assert_eq!(user.email.as_deref(), Some("camille@example.com"));
    }

    #[test]
    fn test_session_expiry() {
        // Arrange
        let json = include_str!("../../../../fixtures/supabase/session.json");
        let session: Session = serde_json::from_str(json).unwrap();
        let expires_at = session.expires_at.unwrap();

        // Act & Assert
        let before = Utc.timestamp_opt(expires_at - 1, 0).unwrap();
        let after = Utc.timestamp_opt(expires_at, 0).unwrap();
        assert!(!session.is_expired_at(before));
        assert!(session.is_expired_at(after));
        assert_eq!(session.display_name(), "camille@example.com");
    }

    #[test]
    fn test_error_body_field_fallbacks() {
        // Arrange
        let gotrue: ErrorBody = serde_json::from_str(
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        )
        .unwrap();
        let legacy: ErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        let postgrest: ErrorBody = serde_json::from_str(
            r#"{"code":"PGRST301","details":null,"hint":null,"message":"JWT expired"}"#,
        )
        .unwrap();

        // Act & Assert
        assert_eq!(gotrue.code(), Some("invalid_credentials"));
        assert_eq!(gotrue.message(), Some("Invalid login credentials"));
        assert_eq!(legacy.code(), Some("invalid_grant"));
        assert_eq!(legacy.message(), Some("Invalid login credentials"));
        assert_eq!(postgrest.code(), Some("PGRST301"));
        assert_eq!(postgrest.message(), Some("JWT expired"));
    }

    #[test]
    fn test_new_row_flattens_item() {
        // Arrange
        let item = LibraryItem {
            media_id: 438_631,
            media_type: MediaKind::Movie,
            title: String::from("Dune"),
            poster_path: None,
        };
        let row = NewRow {
            user_id: "u-1",
            item: &item,
        };

        // Act
        let value = serde_json::to_value(&row).unwrap();

        // Assert
        assert_eq!(
            value,
            serde_json::json!({
                "user_id": "u-1",
                "media_id": 438_631,
                "media_type": "movie",
                "title": "Dune",
                "poster_path": null,
            })
        );
    }
}
