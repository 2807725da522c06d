//! Authentication error classification.

use thiserror::Error;

/// Authentication failure reported by Supabase.
///
/// Known `GoTrue` / `PostgREST` messages are classified into variants so that
/// callers can show a localized message via [`AuthError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// The account exists but its email is not confirmed yet.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// Sign-up with an email that already has an account.
    #[error("user already registered")]
    UserAlreadyRegistered,

    /// Password rejected by the project's password policy.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Too many auth requests or emails.
    #[error("auth rate limit exceeded")]
    RateLimited,

    /// Access token expired or revoked.
    #[error("session expired")]
    SessionExpired,

    /// Anything else.
    #[error("auth error (HTTP {status}): {message}")]
    Unknown {
        /// HTTP status code.
        status: u16,
        /// Raw message from the server.
        message: String,
    },
}

impl AuthError {
    /// Classifies an error response from its status, error code, and message.
    #[must_use]
    pub fn classify(status: u16, code: Option<&str>, message: &str) -> Self {
        let lower = message.to_lowercase();
        match code.unwrap_or_default() {
            "invalid_credentials" => return Self::InvalidCredentials,
            "email_not_confirmed" => return Self::EmailNotConfirmed,
            "user_already_exists" | "email_exists" => return Self::UserAlreadyRegistered,
            "weak_password" => return Self::WeakPassword(String::from(message)),
            "over_request_rate_limit" | "over_email_send_rate_limit" => {
                return Self::RateLimited;
            }
            "session_not_found" | "session_expired" | "bad_jwt" | "PGRST301" | "PGRST303" => {
                return Self::SessionExpired;
            }
            _ => {}
        }

        if lower.contains("invalid login credentials") {
            Self::InvalidCredentials
        } else if lower.contains("email not confirmed") {
            Self::EmailNotConfirmed
        } else if lower.contains("already registered") || lower.contains("already exists") {
            Self::UserAlreadyRegistered
        } else if lower.contains("password should") || lower.contains("weak password") {
            Self::WeakPassword(String::from(message))
        } else if status == 429 || lower.contains("rate limit") {
            Self::RateLimited
        } else if lower.contains("jwt") || (lower.contains("session") && lower.contains("expired"))
        {
            Self::SessionExpired
        } else {
            Self::Unknown {
                status,
                message: String::from(message),
            }
        }
    }

    /// French text shown to the user.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Email ou mot de passe incorrect.",
            Self::EmailNotConfirmed => {
                "Veuillez confirmer votre adresse email avant de vous connecter."
            }
            Self::UserAlreadyRegistered => "Un compte existe déjà avec cette adresse email.",
            Self::WeakPassword(_) => "Le mot de passe doit contenir au moins 6 caractères.",
            Self::RateLimited => "Trop de tentatives. Réessayez dans quelques minutes.",
            Self::SessionExpired => "Votre session a expiré. Reconnectez-vous.",
            Self::Unknown { .. } => "Une erreur est survenue. Réessayez plus tard.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_error_code() {
        // Arrange & Act & Assert
        assert_eq!(
            AuthError::classify(400, Some("invalid_credentials"), "whatever"),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::classify(422, Some("user_already_exists"), "User already registered"),
            AuthError::UserAlreadyRegistered
        );
        assert_eq!(
            AuthError::classify(401, Some("PGRST301"), "JWT expired"),
            AuthError::SessionExpired
        );
    }

    #[test]
    fn test_classify_by_legacy_message() {
        // Arrange & Act & Assert
        assert_eq!(
            AuthError::classify(400, None, "Invalid login credentials"),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::classify(400, None, "Email not confirmed"),
            AuthError::EmailNotConfirmed
        );
        assert_eq!(
            AuthError::classify(422, None, "Password should be at least 6 characters."),
            AuthError::WeakPassword(String::from("Password should be at least 6 characters."))
        );
        assert_eq!(
            AuthError::classify(401, None, "invalid JWT: unable to parse or verify signature"),
            AuthError::SessionExpired
        );
    }

    #[test]
    fn test_classify_rate_limit_by_status() {
        // Arrange & Act
        let err = AuthError::classify(
            429,
            None,
            "For security purposes, you can only request this after 42 seconds.",
        );

        // Assert
        assert_eq!(err, AuthError::RateLimited);
    }

    #[test]
    fn test_unknown_keeps_status_and_message() {
        // Arrange & Act
        let err = AuthError::classify(500, None, "Database error saving new user");

        // Assert
        assert_eq!(
            err,
            AuthError::Unknown {
                status: 500,
                message: String::from("Database error saving new user"),
            }
        );
        assert_eq!(
            err.to_string(),
            "auth error (HTTP 500): Database error saving new user"
        );
        assert_eq!(
            err.user_message(),
            "Une erreur est survenue. Réessayez plus tard."
        );
    }

    #[test]
    fn test_user_messages_are_french() {
        // Arrange & Act & Assert
        assert_eq!(
            AuthError::InvalidCredentials.user_message(),
            "Email ou mot de passe incorrect."
        );
        assert_eq!(
            AuthError::SessionExpired.user_message(),
            "Votre session a expiré. Reconnectez-vous."
        );
    }
}
