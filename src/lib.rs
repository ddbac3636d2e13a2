//! Hymnal content sync, cache invalidation and search.
//!
//! Song documents live in a GitHub repository, one JSON file per song, grouped
//! into one directory per book. This library mirrors that repository into
//! cached in-process views, keeps those views fresh through tag-based
//! invalidation (a secret-gated endpoint and a signed push webhook), and runs
//! full-text search and address-bar suggestions over the song content.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints (axum handlers)
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by every layer
//! - `github` - Contents API client, retry policy and webhook protocol
//! - `management` - Tag-addressed cache, cached catalog and client title cache
//! - `search` - Linear-scan search and the suggestion classifier
//! - `server` - Router assembly and listener
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use hymnsync::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> hymnsync::error::Result<()> {
//!     config::load_env().await.map_err(hymnsync::Error::Configuration)?;
//!     server::start_api_server(config::Settings::from_env()).await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod management;
pub mod search;
pub mod server;
pub mod types;
pub mod utils;

pub use error::Error;

/// Prints an informational line with a blue bullet.
///
/// Terminal output for the CLI only; library and server code log through
/// `tracing` instead.
///
/// ```
/// info!("Fetching titles for {}...", book);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success line with a green checkmark.
///
/// ```
/// success!("Cached {} titles", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error line with a red exclamation mark and exits with code 1.
///
/// Only for failures the command cannot recover from.
///
/// ```
/// error!("Song {} not found in {}", number, book);
/// // unreachable
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning line with a yellow exclamation mark.
///
/// ```
/// warning!("No songs matched '{}'", query);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
