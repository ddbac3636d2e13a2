use colored::Colorize;
use tabled::Table;

use crate::{
    Error,
    cli::{local_catalog, spinner},
    config::Settings,
    error,
    types::{Book, Scope, SongTableRow, StanzaKind},
    utils::compare_song_numbers,
    warning,
};

/// Lists the song files of one book or of every book.
pub async fn songs(book: Option<Book>) {
    let settings = Settings::from_env();
    let catalog = local_catalog(&settings);
    let scope = book.map(Scope::Book).unwrap_or_default();

    let pb = spinner("Listing songs...");
    let mut rows: Vec<SongTableRow> = Vec::new();
    for book in scope.books() {
        match catalog.list_songs(book).await {
            Ok(mut listing) => {
                listing.sort_by(|a, b| compare_song_numbers(&a.number, &b.number));
                rows.extend(listing.into_iter().map(|s| SongTableRow {
                    book: book.display_code().to_string(),
                    number: s.number,
                    path: s.storage_path,
                }));
            }
            Err(e) => {
                pb.suspend(|| warning!("Cannot list {}. Err: {}", book.display_name(), e));
            }
        }
    }
    pb.finish_and_clear();

    if rows.is_empty() {
        warning!("No songs found.");
        return;
    }
    println!("{}", Table::new(rows));
}

/// Prints one song with its stanzas.
pub async fn song(book: Book, number: String) {
    let settings = Settings::from_env();
    let catalog = local_catalog(&settings);

    let pb = spinner(format!("Fetching {} {}...", book.display_code(), number));
    let result = catalog.get_song(book, &number).await;
    pb.finish_and_clear();

    let doc = match result {
        Ok(doc) => doc,
        Err(Error::NotFound(_)) => error!("{} {} does not exist.", book.display_code(), number),
        Err(e) => error!("Cannot load {} {}. Err: {}", book.display_code(), number, e),
    };

    println!(
        "{} {}",
        format!("{} {}", book.display_code(), number).blue().bold(),
        doc.display_title(book, &number).bold()
    );
    if let Some(alt) = doc.alternate_title.as_deref().filter(|a| !a.is_empty()) {
        println!("{}", alt.italic());
    }
    if let Some(key) = doc.key.as_deref().filter(|k| !k.is_empty()) {
        println!("Key: {}", key);
    }

    for stanza in &doc.stanzas {
        println!();
        let heading = match stanza.kind {
            StanzaKind::Verse => stanza.number.clone().unwrap_or_default(),
            StanzaKind::Refrain => stanza.label.clone().unwrap_or_else(|| "Reff".into()),
        };
        println!("{}", heading.green().bold());
        for line in &stanza.lines {
            if stanza.kind == StanzaKind::Refrain {
                println!("  {}", line.italic());
            } else {
                println!("  {}", line);
            }
        }
    }
}
