use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use tokio::sync::OnceCell;

use crate::{
    management::Catalog,
    search::SearchEngine,
    types::{Book, Scope, Suggestions},
    utils::compare_song_numbers,
};

const NUMBERS_PER_BOOK: usize = 5;
const TEXT_SUGGESTIONS: usize = 10;

static BOOK_AND_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(be|bn|kj)\s*(\d+)$").unwrap());

/// Tiered query classifier producing address-bar suggestions.
///
/// One instance is one suggestion session: the song-number index it consults
/// is built on first use and kept until the instance is dropped.
pub struct Suggester {
    catalog: Catalog,
    engine: SearchEngine,
    index: OnceCell<HashMap<Book, Vec<String>>>,
}

impl Suggester {
    pub fn new(catalog: Catalog, engine: SearchEngine) -> Self {
        Self {
            catalog,
            engine,
            index: OnceCell::new(),
        }
    }

    async fn numbers(&self, book: Book) -> &[String] {
        let index = self
            .index
            .get_or_init(|| async {
                let mut index = HashMap::new();
                for book in Book::ALL {
                    let mut numbers: Vec<String> = match self.catalog.list_songs(book).await {
                        Ok(songs) => songs.into_iter().map(|s| s.number).collect(),
                        Err(e) => {
                            tracing::warn!(book = %book, error = %e, "song index unavailable");
                            Vec::new()
                        }
                    };
                    numbers.sort_by(|a, b| compare_song_numbers(a, b));
                    index.insert(book, numbers);
                }
                index
            })
            .await;
        index.get(&book).map(Vec::as_slice).unwrap_or_default()
    }

    pub async fn suggest(&self, query: &str) -> Suggestions {
        let query = query.trim();
        let mut out = Suggestions::new(query);
        if query.is_empty() {
            return out;
        }

        if let Some(caps) = BOOK_AND_NUMBER.captures(query) {
            // the pattern only admits known codes
            let Ok(book) = caps[1].parse::<Book>() else {
                return out;
            };
            let number = &caps[2];
            let label = format!("{} {}", book.display_code(), number);

            if self.numbers(book).await.iter().any(|n| n == number) {
                out.push(
                    format!("Open {}", label),
                    label.clone(),
                    song_target(book, number),
                );
            } else {
                out.push(
                    format!("Search {}", label),
                    format!("Search results for {}", label),
                    search_target(&label),
                );
            }
            push_generic(&mut out, query);
            return out;
        }

        if query.chars().all(|c| c.is_ascii_digit()) {
            for book in Book::ALL {
                let matches = self
                    .numbers(book)
                    .await
                    .iter()
                    .filter(|n| n.starts_with(query))
                    .take(NUMBERS_PER_BOOK);
                for number in matches {
                    out.push(
                        format!("{} {}", book.display_code(), number),
                        format!("{} {}", book.display_name(), number),
                        song_target(book, number),
                    );
                }
            }
            push_generic(&mut out, query);
            return out;
        }

        let hits = self.engine.search(query, Scope::All).await;
        for hit in hits.into_iter().take(TEXT_SUGGESTIONS) {
            out.push(
                hit.title,
                format!("{} {}", hit.book.display_code(), hit.number),
                song_target(hit.book, &hit.number),
            );
        }
        out
    }
}

fn push_generic(out: &mut Suggestions, query: &str) {
    out.push(
        format!("Search \"{}\" in content", query),
        "Title & lyrics search".to_string(),
        search_target(query),
    );
}

pub fn song_target(book: Book, number: &str) -> String {
    format!("/songs/{}/{}", book.code(), urlencoding::encode(number))
}

pub fn search_target(query: &str) -> String {
    format!("/search?q={}", urlencoding::encode(query))
}
