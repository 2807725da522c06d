//! `SupabaseClient` - `GoTrue` auth and `PostgREST` rows over HTTP.

use std::fmt;

use anyhow::{Context, Result, bail};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;
use tracing::instrument;
use url::Url;

use super::api::{LocalAuthApi, LocalLibraryApi};
use super::error::AuthError;
use super::types::{
    ErrorBody, LibraryEntry, LibraryItem, ListKind, NewRow, Session, SignUpOutcome,
    SignUpResponse, User,
};
use crate::tmdb::MediaKind;

/// Supabase project client.
#[derive(Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct SupabaseClient {
    /// HTTP client.
    http_client: Client,
    /// Project URL (always ends with `/`).
    base_url: Url,
    /// Public anon key, sent as `apikey` on every request.
    anon_key: String,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Builder for `SupabaseClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SupabaseClientBuilder {
    url: Option<Url>,
    anon_key: Option<String>,
    user_agent: Option<String>,
}

impl SupabaseClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            url: None,
            anon_key: None,
            user_agent: None,
        }
    }

    /// Sets the project URL (required).
    #[must_use]
    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Sets the anon key (required).
    #[must_use]
    pub fn anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `url`, `anon_key`, or `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<SupabaseClient> {
        let mut base_url = self.url.context("url is required")?;
        let anon_key = self.anon_key.context("anon_key is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .build()
            .context("failed to build HTTP client")?;

        Ok(SupabaseClient {
            http_client,
            base_url,
            anon_key,
        })
    }
}

impl SupabaseClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> SupabaseClientBuilder {
        SupabaseClientBuilder::new()
    }

    /// Project URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.base_url
    }

    /// Starts a request to `path` with the `apikey` header.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;
        Ok(self
            .http_client
            .request(method, url)
            .header("apikey", &self.anon_key))
    }

    /// Starts a REST request against a list table, filtered to the session user.
    fn table_request(
        &self,
        method: Method,
        session: &Session,
        kind: ListKind,
    ) -> Result<RequestBuilder> {
        let path = format!("rest/v1/{}", kind.table());
        Ok(self
            .request(method, &path)?
            .bearer_auth(&session.access_token)
            .query(&[("user_id", format!("eq.{}", session.user.id))]))
    }
}

/// Sends an auth request and returns the successful response.
async fn send_auth(builder: RequestBuilder, path: &str) -> Result<Response> {
    tracing::debug!(path, "Supabase auth request");
    let result = builder.send().await;
    let response = result.with_context(|| format!("request failed: {path}"))?;
    check_auth(response).await
}

/// Sends a REST request and returns the successful response.
async fn send_rest(builder: RequestBuilder, table: &str) -> Result<Response> {
    tracing::debug!(table, "Supabase REST request");
    let result = builder.send().await;
    let response = result.with_context(|| format!("request failed: rest/v1/{table}"))?;
    check_rest(response, table).await
}

/// Converts a failed auth response into an [`AuthError`].
async fn check_auth(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(read_auth_error(response, status).await.into())
}

/// Converts a failed REST response into an error; expired tokens map to [`AuthError`].
async fn check_rest(response: Response, table: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(read_auth_error(response, status).await.into());
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<failed to read body>"));
    let error_body: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = error_body.message().unwrap_or(&body);
    bail!("Supabase REST error on {table} (HTTP {status}): {message}");
}

async fn read_auth_error(response: Response, status: StatusCode) -> AuthError {
    let body = response.text().await.unwrap_or_default();
    let error_body: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = error_body.message().unwrap_or(&body);
    let error = AuthError::classify(status.as_u16(), error_body.code(), message);
    tracing::debug!(%status, %error, "Supabase auth error");
    error
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
    let body = response
        .text()
        .await
        .with_context(|| format!("failed to read response body: {path}"))?;
    let raw_result: std::result::Result<T, _> = serde_json::from_str(&body);
    let parsed = raw_result.with_context(|| format!("failed to decode JSON response: {path}"))?;
    Ok(parsed)
}

impl LocalAuthApi for SupabaseClient {
    #[instrument(skip_all)]
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let path = "auth/v1/signup";
        let builder = self
            .request(Method::POST, path)?
            .json(&json!({ "email": email, "password": password }));
        let response = send_auth(builder, path).await?;
        let outcome: SignUpResponse = decode(response, path).await?;
        Ok(outcome.into())
    }

    #[instrument(skip_all)]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let path = "auth/v1/token";
        let builder = self
            .request(Method::POST, path)?
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response = send_auth(builder, path).await?;
        decode(response, path).await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, session: &Session) -> Result<()> {
        let path = "auth/v1/logout";
        let builder = self
            .request(Method::POST, path)?
            .bearer_auth(&session.access_token);
        send_auth(builder, path).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn current_user(&self, session: &Session) -> Result<User> {
        let path = "auth/v1/user";
        let builder = self
            .request(Method::GET, path)?
            .bearer_auth(&session.access_token);
        let response = send_auth(builder, path).await?;
        decode(response, path).await
    }
}

impl LocalLibraryApi for SupabaseClient {
    #[instrument(skip_all)]
    async fn add(
        &self,
        session: &Session,
        kind: ListKind,
        item: &LibraryItem,
    ) -> Result<LibraryEntry> {
        let path = format!("rest/v1/{}", kind.table());
        let row = NewRow {
            user_id: &session.user.id,
            item,
        };
        let builder = self
            .request(Method::POST, &path)?
            .bearer_auth(&session.access_token)
            .header("Prefer", "return=representation")
            .json(&row);
        let response = send_rest(builder, kind.table()).await?;
        let rows: Vec<LibraryEntry> = decode(response, &path).await?;
        rows.into_iter()
            .next()
            .with_context(|| format!("insert into {} returned no row", kind.table()))
    }

    #[instrument(skip_all)]
    async fn remove(
        &self,
        session: &Session,
        kind: ListKind,
        media_id: u64,
        media_type: MediaKind,
    ) -> Result<()> {
        let builder = self
            .table_request(Method::DELETE, session, kind)?
            .query(&[
                ("media_id", format!("eq.{media_id}")),
                ("media_type", format!("eq.{media_type}")),
            ]);
        send_rest(builder, kind.table()).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn list(&self, session: &Session, kind: ListKind) -> Result<Vec<LibraryEntry>> {
        let builder = self
            .table_request(Method::GET, session, kind)?
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let response = send_rest(builder, kind.table()).await?;
        decode(response, kind.table()).await
    }

    #[instrument(skip_all)]
    async fn contains(
        &self,
        session: &Session,
        kind: ListKind,
        media_id: u64,
        media_type: MediaKind,
    ) -> Result<bool> {
        let builder = self
            .table_request(Method::GET, session, kind)?
            .query(&[
                ("select", String::from("media_id")),
                ("media_id", format!("eq.{media_id}")),
                ("media_type", format!("eq.{media_type}")),
                ("limit", String::from("1")),
            ]);
        let response = send_rest(builder, kind.table()).await?;
        let rows: Vec<IgnoredAny> = decode(response, kind.table()).await?;
        Ok(!rows.is_empty())
    }
}
