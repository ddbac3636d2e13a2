//! # CLI Module
//!
//! Terminal front-end over the same operations the HTTP API serves. Every
//! command builds its own cached catalog from the environment, talks to the
//! backing store directly, and renders results as tables.
//!
//! ## Commands
//!
//! - [`serve`] - Runs the HTTP API
//! - [`songs`] - Lists song files per book
//! - [`song`] - Prints one song with its stanzas
//! - [`titles`] - Shows a book's title index through the client title cache
//! - [`search`] - Full-text search over titles and lyrics
//! - [`suggest`] - Address-bar suggestions, optionally opening the first one
//!
//! ## Usage Patterns
//!
//! ```bash
//! hymnsync serve                       # start the API on SERVER_ADDRESS
//! hymnsync song be 57                  # read one song
//! hymnsync titles bn --warm            # title index, warming the other books
//! hymnsync titles kj --server http://localhost:3000 --refresh
//! hymnsync search "haleluya" --book be
//! hymnsync suggest "BE 57" --open
//! ```
//!
//! ## Error Handling
//!
//! Configuration problems (a missing `GITHUB_TOKEN`, an unparsable address)
//! end the command through [`crate::error!`]. Degraded results, such as a
//! search that found nothing because the store was unreachable, are reported
//! with [`crate::warning!`] and an empty table.

mod search;
mod serve;
mod songs;
mod titles;

use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

pub use search::{search, suggest};
pub use serve::serve;
pub use songs::{song, songs};
pub use titles::titles;

use crate::{
    config::{self, Settings},
    error,
    github::{Contents, StoreClient},
    management::{Catalog, ResponseCache},
    search::SearchEngine,
};

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

fn local_catalog(settings: &Settings) -> Catalog {
    if settings.store.token.is_none() {
        error!(
            "GITHUB_TOKEN is missing. Set it in the environment or in {}",
            config::data_dir().join(".env").display()
        );
    }
    let client = match StoreClient::new(settings.store.clone()) {
        Ok(client) => client,
        Err(e) => error!("Cannot create store client. Err: {}", e),
    };
    Catalog::new(
        Contents::new(client, settings.title_concurrency),
        Arc::new(ResponseCache::default()),
    )
}

fn local_search(settings: &Settings) -> (Catalog, SearchEngine) {
    let catalog = local_catalog(settings);
    let engine = SearchEngine::new(catalog.clone(), settings.search.clone());
    (catalog, engine)
}
