use std::sync::Arc;

use tabled::Table;

use crate::{
    cli::{local_catalog, spinner},
    config::Settings,
    error, info,
    management::{
        ApiTitleSource, FileSnapshotStore, SystemClock, TitleCache, TitleSource,
        titles::STORAGE_KEY,
    },
    success,
    types::{Book, TitleTableRow},
    utils::compare_song_numbers,
    warning,
};

/// Shows the title index of `book` through the client title cache.
///
/// Titles come from the store directly, or from the `/api/titles` endpoint of
/// a running server when `server` is given. The snapshot lives in the local
/// data directory so repeated calls within the TTL never hit the network.
pub async fn titles(book: Book, server: Option<String>, refresh: bool, warm: bool) {
    let settings = Settings::from_env();
    let source: Arc<dyn TitleSource> = match server {
        Some(url) => {
            info!("Reading titles from {}", url);
            Arc::new(ApiTitleSource::new(url))
        }
        None => Arc::new(local_catalog(&settings)),
    };
    let store = FileSnapshotStore::in_data_dir(STORAGE_KEY);
    let cache = TitleCache::with_ttl(
        source,
        Arc::new(store),
        Arc::new(SystemClock),
        settings.titles_ttl,
    );

    if refresh {
        cache.invalidate(book).await;
    }

    let pb = spinner(format!("Loading titles for {}...", book.display_name()));
    let prefetch = if warm {
        cache.prefetch_other_books(book)
    } else {
        Vec::new()
    };
    let result = cache.load_titles(book).await;
    let warmed = prefetch.len();
    for handle in prefetch {
        let _ = handle.await;
    }
    pb.finish_and_clear();

    let map = match result {
        Ok(map) => map,
        Err(e) => error!("Cannot load titles for {}. Err: {}", book.display_name(), e),
    };

    let mut rows: Vec<TitleTableRow> = map
        .into_iter()
        .map(|(key, title)| TitleTableRow {
            number: key
                .split_once('/')
                .map(|(_, n)| n.to_string())
                .unwrap_or(key),
            title,
        })
        .collect();
    rows.sort_by(|a, b| compare_song_numbers(&a.number, &b.number));

    if rows.is_empty() {
        warning!("{} has no titles.", book.display_name());
        return;
    }
    let count = rows.len();
    println!("{}", Table::new(rows));
    success!("{} titles in {}", count, book.display_name());
    if warmed > 0 {
        info!("Warmed {} other books", warmed);
    }
}
