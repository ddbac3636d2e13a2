use tabled::Table;

use crate::{
    cli::{local_search, spinner},
    config::Settings,
    error, info,
    search::Suggester,
    types::{Book, HitTableRow, Scope, SuggestionTableRow},
    warning,
};

pub async fn search(query: String, book: Option<Book>) {
    let settings = Settings::from_env();
    let (_, engine) = local_search(&settings);
    let scope = book.map(Scope::Book).unwrap_or_default();

    let pb = spinner(format!("Searching for '{}'...", query));
    let hits = engine.search(&query, scope).await;
    pb.finish_and_clear();

    if hits.is_empty() {
        warning!("No songs matched '{}'.", query);
        return;
    }

    let count = hits.len();
    let rows: Vec<HitTableRow> = hits
        .into_iter()
        .map(|h| HitTableRow {
            song: format!("{} {}", h.book.display_code(), h.number),
            title: h.title,
            snippet: h.snippet,
        })
        .collect();
    println!("{}", Table::new(rows));
    info!("{} result(s)", count);
}

/// Prints suggestions for `query`; with `open`, opens the first target in the browser.
pub async fn suggest(query: String, open: bool) {
    let settings = Settings::from_env();
    let (catalog, engine) = local_search(&settings);
    let suggester = Suggester::new(catalog, engine);

    let pb = spinner("Collecting suggestions...");
    let suggestions = suggester.suggest(&query).await;
    pb.finish_and_clear();

    if suggestions.is_empty() {
        warning!("No suggestions for '{}'.", query);
        return;
    }

    let rows: Vec<SuggestionTableRow> = suggestions
        .labels()
        .iter()
        .zip(suggestions.descriptions())
        .zip(suggestions.targets())
        .map(|((label, description), target)| SuggestionTableRow {
            label: label.clone(),
            description: description.clone(),
            target: target.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));

    if open {
        let Some(target) = suggestions.targets().first() else {
            return;
        };
        let url = format!("{}{}", settings.site_url, target);
        info!("Opening {}", url);
        if webbrowser::open(&url).is_err() {
            error!("Cannot open browser. Visit {} manually.", url);
        }
    }
}
