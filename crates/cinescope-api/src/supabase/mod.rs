//! Supabase client module.
//!
//! Wraps `GoTrue` (email/password auth) and `PostgREST` (favorites and
//! watched rows) over plain HTTP.

mod api;
mod client;
mod error;
mod types;

pub use api::{AuthApi, LibraryApi, LocalAuthApi, LocalLibraryApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{SupabaseClient, SupabaseClientBuilder};
pub use error::AuthError;
pub use types::{LibraryEntry, LibraryItem, ListKind, Session, SignUpOutcome, User};
