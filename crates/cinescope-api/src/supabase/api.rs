//! `AuthApi` and `LibraryApi` trait definitions.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{LibraryEntry, LibraryItem, ListKind, Session, SignUpOutcome, User};
use crate::tmdb::MediaKind;

/// Supabase auth trait.
///
/// Failures with a known meaning carry an [`super::AuthError`] that can be
/// recovered with `anyhow::Error::downcast_ref`.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(AuthApi: Send)]
pub trait LocalAuthApi {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the server rejects the sign-up.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the credentials are rejected.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Revokes the session on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the token is rejected.
    async fn sign_out(&self, session: &Session) -> Result<()>;

    /// Fetches the user owning the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the token is rejected.
    async fn current_user(&self, session: &Session) -> Result<User>;
}

/// Favorites / watched rows trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(LibraryApi: Send)]
pub trait LocalLibraryApi {
    /// Adds a title to a list and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the insert is rejected.
    async fn add(
        &self,
        session: &Session,
        kind: ListKind,
        item: &LibraryItem,
    ) -> Result<LibraryEntry>;

    /// Removes a title from a list. Removing an absent title is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the delete is rejected.
    async fn remove(
        &self,
        session: &Session,
        kind: ListKind,
        media_id: u64,
        media_type: MediaKind,
    ) -> Result<()>;

    /// Lists the user's rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn list(&self, session: &Session, kind: ListKind) -> Result<Vec<LibraryEntry>>;

    /// Returns `true` if the title is in the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn contains(
        &self,
        session: &Session,
        kind: ListKind,
        media_id: u64,
        media_type: MediaKind,
    ) -> Result<bool>;
}
