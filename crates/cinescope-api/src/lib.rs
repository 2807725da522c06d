//! API client library for cinescope.
//!
//! Provides clients for the TMDB API and for Supabase auth and row storage.

/// Supabase auth and favorites/watched client.
pub mod supabase;

/// TMDB API client.
pub mod tmdb;
