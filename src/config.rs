//! Configuration management for the hymnal sync service.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage the backing
//! store credential, the invalidation secrets, server settings, and the tunables of
//! the search and fetch machinery.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)
//!
//! Secrets left at their documented placeholder value are reported as
//! "not configured", never accepted as a real secret.

use std::{env, path::PathBuf, time::Duration};

use crate::{
    Error,
    github::{RetryPolicy, StoreConfig},
    search::SearchSettings,
};

/// Placeholder shipped in `.env.example` for the store token.
pub const TOKEN_PLACEHOLDER: &str = "PASTE_YOUR_NEW_AND_SECRET_TOKEN_HERE";

/// Placeholder shipped in `.env.example` for both invalidation secrets.
pub const SECRET_PLACEHOLDER: &str = "CHANGE_ME";

const DEFAULT_STORE_API_URL: &str = "https://api.github.com";
const DEFAULT_STORE_REPO: &str = "hkbpperawang/nyanyian-source";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Looks for `hymnsync/.env` below the platform-specific local data directory:
/// - Linux: `~/.local/share/hymnsync/.env`
/// - macOS: `~/Library/Application Support/hymnsync/.env`
/// - Windows: `%LOCALAPPDATA%/hymnsync/.env`
///
/// A missing file is not an error; the process environment alone may carry
/// every setting (the usual case for a deployed server).
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created or the
/// `.env` file exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Returns `hymnsync/` inside the platform local data directory.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("hymnsync");
    path
}

/// Returns the access token for the backing store.
///
/// Reads `GH_TOKEN`, falling back to `GITHUB_TOKEN`.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if neither is set or the value is the
/// placeholder from `.env.example`.
pub fn store_token() -> Result<String, Error> {
    let raw = env::var("GH_TOKEN")
        .ok()
        .or_else(|| env::var("GITHUB_TOKEN").ok());
    configured(raw, TOKEN_PLACEHOLDER)
        .ok_or_else(|| Error::Configuration("GITHUB_TOKEN is missing".into()))
}

/// Returns the shared secret for the manual invalidation endpoint.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if `REVALIDATE_SECRET` is unset or `CHANGE_ME`.
pub fn revalidate_secret() -> Result<String, Error> {
    configured(env::var("REVALIDATE_SECRET").ok(), SECRET_PLACEHOLDER)
        .ok_or_else(|| Error::Configuration("Server missing REVALIDATE_SECRET".into()))
}

/// Returns the HMAC key for repository webhooks.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if `GITHUB_WEBHOOK_SECRET` is unset or `CHANGE_ME`.
pub fn webhook_secret() -> Result<String, Error> {
    configured(env::var("GITHUB_WEBHOOK_SECRET").ok(), SECRET_PLACEHOLDER)
        .ok_or_else(|| Error::Configuration("Server missing GITHUB_WEBHOOK_SECRET".into()))
}

/// Returns the address the HTTP server binds to, e.g. `127.0.0.1:3000`.
pub fn server_addr() -> String {
    env::var("SERVER_ADDRESS").unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Returns the public base URL of the site (used for sitemap and browser links).
pub fn site_url() -> String {
    env::var("SITE_URL")
        .unwrap_or_else(|_| DEFAULT_SITE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Returns the base URL of the contents API.
pub fn store_api_url() -> String {
    env::var("STORE_API_URL").unwrap_or_else(|_| DEFAULT_STORE_API_URL.to_string())
}

/// Returns the `owner/name` of the repository holding the song documents.
pub fn store_repo() -> String {
    env::var("STORE_REPO").unwrap_or_else(|_| DEFAULT_STORE_REPO.to_string())
}

/// Treats empty values and the placeholder as "not configured".
pub fn configured(value: Option<String>, placeholder: &str) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != placeholder)
}

fn number<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Everything the server needs, resolved once at startup.
///
/// Secrets are kept as `Option` so an unconfigured secret disables only the
/// endpoint that needs it instead of preventing startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreConfig,
    pub revalidate_secret: Option<String>,
    pub webhook_secret: Option<String>,
    pub server_addr: String,
    pub site_url: String,
    pub search: SearchSettings,
    pub title_concurrency: usize,
    pub titles_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        let retry = RetryPolicy::new(
            number("FETCH_RETRIES", 2),
            Duration::from_millis(number("FETCH_RETRY_DELAY_MS", 400)),
        );

        Self {
            store: StoreConfig {
                api_url: store_api_url(),
                repo: store_repo(),
                token: store_token().ok(),
                timeout: Duration::from_millis(number("FETCH_TIMEOUT_MS", 8000)),
                retry,
            },
            revalidate_secret: revalidate_secret().ok(),
            webhook_secret: webhook_secret().ok(),
            server_addr: server_addr(),
            site_url: site_url(),
            search: SearchSettings {
                snippet_radius: number("SEARCH_SNIPPET_RADIUS", 30),
                max_results: number("SEARCH_MAX_RESULTS", 50),
                concurrency: number("FETCH_CONCURRENCY", 8),
            },
            title_concurrency: number("TITLE_CONCURRENCY", 16),
            titles_ttl: Duration::from_secs(number("TITLES_TTL_SECS", 3600)),
        }
    }
}
