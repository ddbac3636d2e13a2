use crate::{
    management::Catalog,
    search::SearchSettings,
    types::{Scope, SearchHit, SongRef},
    utils::{find_case_insensitive, run_windowed, snippet_around},
};

#[derive(Clone)]
pub struct SearchEngine {
    catalog: Catalog,
    settings: SearchSettings,
}

impl SearchEngine {
    pub fn new(catalog: Catalog, settings: SearchSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Case-insensitive substring search in discovery order.
    ///
    /// Never fails: books whose listing cannot be read and documents that
    /// cannot be fetched are skipped, so an unreachable store yields no hits.
    pub async fn search(&self, query: &str, scope: Scope) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() || self.settings.max_results == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<SongRef> = Vec::new();
        for book in scope.books() {
            match self.catalog.scan_listing(book).await {
                Ok(songs) => candidates.extend(songs),
                Err(e) => tracing::warn!(book = %book, error = %e, "skipping book in search"),
            }
        }

        let window = self.settings.concurrency.max(1);
        let mut hits = Vec::new();
        let mut remaining = candidates.into_iter().peekable();

        while remaining.peek().is_some() && hits.len() < self.settings.max_results {
            let chunk: Vec<SongRef> = remaining.by_ref().take(window).collect();
            let found = run_windowed(chunk, window, |song| self.scan(song, query)).await;
            hits.extend(found.into_iter().flatten());
        }

        hits.truncate(self.settings.max_results);
        tracing::debug!(query, hits = hits.len(), "search finished");
        hits
    }

    async fn scan(&self, song: SongRef, query: &str) -> Option<SearchHit> {
        let doc = match self.catalog.scan_song(&song).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(path = %song.storage_path, error = %e, "skipping document");
                return None;
            }
        };

        // a match may not span two fields; `start` counts chars in the joined text
        let fields = doc.fields();
        let mut offset = 0;
        let mut start = None;
        for field in &fields {
            if let Some(pos) = find_case_insensitive(field, query) {
                start = Some(offset + pos);
                break;
            }
            offset += field.chars().count() + 1;
        }
        let start = start?;

        let haystack = fields.join("\n");
        let snippet = snippet_around(
            &haystack,
            start,
            query.chars().count(),
            self.settings.snippet_radius,
        );

        Some(SearchHit {
            book: song.book,
            title: doc.display_title(song.book, &song.number),
            number: song.number,
            snippet,
        })
    }
}
