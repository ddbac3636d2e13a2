use std::{cmp::Ordering, future::Future};

use futures::future::join_all;
use subtle::ConstantTimeEq;

use crate::types::Book;

/// Total order over song numbers.
///
/// Numbers with a leading run of digits come first, ordered by that numeric
/// prefix and then by the full string (`57` < `57a` < `58`). Numbers without a
/// digit prefix follow, ordered lexicographically.
pub fn compare_song_numbers(a: &str, b: &str) -> Ordering {
    match (numeric_prefix(a), numeric_prefix(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numeric_prefix(value: &str) -> Option<u128> {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // an absurdly long run saturates instead of failing
    Some(digits.parse::<u128>().unwrap_or(u128::MAX))
}

/// Strips a leading book code (`"BE 57 ..."` -> `"57 ..."`).
///
/// The book's own code is tried first; otherwise any two uppercase ASCII
/// letters followed by whitespace are removed.
pub fn clean_title(book: Book, title: &str) -> String {
    let prefix = format!("{} ", book.display_code());
    if let Some(rest) = title.strip_prefix(&prefix) {
        return rest.trim_start().to_string();
    }

    let mut chars = title.char_indices();
    let code = matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some((_, a)), Some((_, b)), Some((_, c)))
            if a.is_ascii_uppercase() && b.is_ascii_uppercase() && c.is_whitespace()
    );
    if code {
        return title[2..].trim_start().to_string();
    }
    title.to_string()
}

/// Removes a trailing `.json` from a file name.
///
/// The match is case-sensitive like the store's paths: `57.JSON` is not a
/// song document.
pub fn strip_document_extension(name: &str) -> Option<&str> {
    name.strip_suffix(".json")
}

/// Whether `number` can name a song file: ASCII letters, digits, `_` and `-`.
///
/// Anything else could leave the book directory or rewrite the request URL
/// once it is placed into a contents path.
pub fn is_song_number(number: &str) -> bool {
    !number.is_empty()
        && number
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Runs `f` over `items` in sequential windows of `window` concurrent calls.
///
/// Results keep input order regardless of completion order.
pub async fn run_windowed<T, R, F, Fut>(items: Vec<T>, window: usize, f: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut out = Vec::with_capacity(items.len());
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        let chunk: Vec<Fut> = items.by_ref().take(window.max(1)).map(&f).collect();
        out.extend(join_all(chunk).await);
    }
    out
}

/// Constant-time string comparison for secrets.
pub fn secrets_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Finds the first case-insensitive occurrence of `needle`.
///
/// Returns the match position counted in characters. Comparison is done per
/// character on its lower-case mapping so positions never drift on text whose
/// lower-case form has a different byte length.
pub fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay: Vec<char> = haystack.chars().collect();
    let pat: Vec<char> = needle.chars().collect();
    if pat.is_empty() || pat.len() > hay.len() {
        return None;
    }

    (0..=hay.len() - pat.len()).find(|&start| {
        hay[start..start + pat.len()]
            .iter()
            .zip(&pat)
            .all(|(h, p)| h.to_lowercase().eq(p.to_lowercase()))
    })
}

/// Cuts `radius` characters either side of a match and flattens newlines.
pub fn snippet_around(haystack: &str, start: usize, len: usize, radius: usize) -> String {
    let total = haystack.chars().count();
    let from = start.saturating_sub(radius);
    let to = (start + len + radius).min(total);
    haystack
        .chars()
        .skip(from)
        .take(to - from)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
