//! Full-text search and address-bar suggestions over song content.
//!
//! There is no index: every query lists the candidate books and scans each
//! document through the cached catalog, a fixed number of fetches at a time.

mod engine;
mod suggest;

pub use engine::SearchEngine;
pub use suggest::Suggester;

/// Tunables of the linear scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Characters kept on each side of the first match.
    pub snippet_radius: usize,
    /// Hits returned at most, counted across all books.
    pub max_results: usize,
    /// Documents fetched concurrently per window.
    pub concurrency: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            snippet_radius: 30,
            max_results: 50,
            concurrency: 8,
        }
    }
}
