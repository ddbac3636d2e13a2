//! # GitHub Integration Module
//!
//! This module is the only place that talks to the repository holding the song
//! documents. It is split by responsibility:
//!
//! ```text
//! Catalog / Search / API handlers
//!          ↓
//! contents  (book-scoped accessors: list songs, get song, list titles)
//!          ↓
//! StoreClient (authenticated contents API access, timeout + retry)
//!          ↓
//! GitHub contents API
//! ```
//!
//! [`webhook`] holds the repository's push-event protocol: signature
//! verification and the payload shape.
//!
//! ## Error Handling
//!
//! - A missing or placeholder token is reported as [`Error::Configuration`]
//!   before any request is made, so operators can tell "not configured" from
//!   "rejected".
//! - `404` maps to [`Error::NotFound`].
//! - Timeouts, transport faults, `429` and `5xx` are retried by the
//!   [`RetryPolicy`] and then surfaced.

pub mod contents;
pub mod retry;
pub mod webhook;

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Deserialize, de::DeserializeOwned};

pub use contents::Contents;
pub use retry::RetryPolicy;

use crate::{
    Error,
    error::Result,
    types::DirEntry,
};

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Connection settings for the backing store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_url: String,
    /// `owner/name` of the repository.
    pub repo: String,
    /// `None` when unset or left at the placeholder.
    pub token: Option<String>,
    /// Upper bound for one attempt, including reading the body.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

#[derive(Deserialize)]
struct FilePayload {
    content: String,
}

/// Authenticated access to the contents API of one repository.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: Client,
    config: StoreConfig,
}

impl StoreClient {
    /// Builds a client whose every request carries the identity headers.
    ///
    /// A missing token is not checked here; it surfaces on the first request
    /// so a server can start and report the misconfiguration per endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the underlying HTTP client cannot be
    /// built (for example when no TLS backend is available).
    ///
    /// # Example
    ///
    /// ```
    /// let client = StoreClient::new(Settings::from_env().store)?;
    /// let entries = client.list_directory("be").await?;
    /// ```
    pub fn new(config: StoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("hymnsync/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn credential(&self) -> Result<&str> {
        match self.config.token.as_deref() {
            Some(token) => Ok(token),
            None => {
                tracing::error!("store token is not configured");
                Err(Error::Configuration("GITHUB_TOKEN is missing".into()))
            }
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{base}/repos/{repo}/contents/{path}",
            base = self.config.api_url.trim_end_matches('/'),
            repo = self.config.repo,
            path = path.trim_start_matches('/'),
        )
    }

    /// Lists the entries of a directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Repository-relative directory, e.g. `be`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DirEntry>)` - Files and sub-directories in API order
    /// - `Err(Error::Configuration)` - No token configured, nothing was sent
    /// - `Err(Error::NotFound)` - The directory does not exist
    /// - `Err(Error::Upstream | Error::Timeout | Error::Transport)` - after the
    ///   retry policy gave up on a transient failure, or at once otherwise
    /// - `Err(Error::MalformedContent)` - The body is not a directory listing
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.get_json(path).await
    }

    /// Fetches one file and decodes its base64 payload.
    ///
    /// The contents API wraps the payload at 60 columns; whitespace is dropped
    /// before decoding.
    ///
    /// # Errors
    ///
    /// Same as [`StoreClient::list_directory`], plus
    /// [`Error::MalformedContent`] when the payload is not valid base64.
    pub async fn get_file(&self, path: &str) -> Result<Vec<u8>> {
        let payload: FilePayload = self.get_json(path).await?;
        // the API wraps base64 at 60 columns
        let cleaned: String = payload
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(cleaned)
            .map_err(|e| Error::malformed(path, e))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let token = self.credential()?;
        let url = self.contents_url(path);
        let url = url.as_str();

        let body = self
            .config
            .retry
            .run(move || async move { self.attempt(url, token, path).await })
            .await?;

        serde_json::from_slice(&body).map_err(|e| Error::malformed(path, e))
    }

    async fn attempt(&self, url: &str, token: &str, path: &str) -> Result<Vec<u8>> {
        let timeout = self.config.timeout;
        let call = async {
            let response = self.http.get(url).bearer_auth(token).send().await?;
            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return Err(Error::NotFound(path.to_string()));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(response.bytes().await?.to_vec())
        };

        // dropping the request future on timeout aborts the connection
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }
}
