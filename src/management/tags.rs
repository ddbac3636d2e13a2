use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    types::{Book, Scope},
    utils::strip_document_extension,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Songs,
    Titles,
    Content,
    Song,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Songs => "songs",
            TagKind::Titles => "titles",
            TagKind::Content => "content",
            TagKind::Song => "song",
        }
    }
}

/// Kinds invalidated when a trigger does not name any tags.
pub const DEFAULT_TAG_KINDS: [TagKind; 3] = [TagKind::Songs, TagKind::Titles, TagKind::Content];

/// Invalidation key. Matching is exact: `songs` and `songs:be` are unrelated keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTag(String);

impl CacheTag {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn kind(kind: TagKind) -> Self {
        Self(kind.as_str().to_string())
    }

    pub fn scoped(kind: TagKind, book: Book) -> Self {
        Self(format!("{}:{}", kind.as_str(), book.code()))
    }

    pub fn song(book: Book, number: &str) -> Self {
        Self(format!("{}:{}:{}", TagKind::Song.as_str(), book.code(), number))
    }

    /// `t` -> `t:<book>`
    pub fn with_book(&self, book: Book) -> Self {
        Self(format!("{}:{}", self.0, book.code()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn songs_tags(book: Book) -> Vec<CacheTag> {
    vec![
        CacheTag::kind(TagKind::Songs),
        CacheTag::scoped(TagKind::Songs, book),
    ]
}

pub fn song_tags(book: Book, number: &str) -> Vec<CacheTag> {
    vec![CacheTag::kind(TagKind::Song), CacheTag::song(book, number)]
}

pub fn titles_tags(book: Book) -> Vec<CacheTag> {
    vec![
        CacheTag::kind(TagKind::Titles),
        CacheTag::scoped(TagKind::Titles, book),
    ]
}

pub fn content_tags(book: Book) -> Vec<CacheTag> {
    vec![
        CacheTag::kind(TagKind::Content),
        CacheTag::scoped(TagKind::Content, book),
    ]
}

/// The single primitive offered by whatever owns the cached responses.
pub trait TagInvalidator: Send + Sync {
    /// Purges every entry carrying `tag`; returns how many were dropped.
    fn invalidate_tag(&self, tag: &CacheTag) -> usize;
}

/// Dispatches every tag. Cold tags are simply a no-op.
pub fn invalidate_tags(invalidator: &dyn TagInvalidator, tags: &[CacheTag]) -> usize {
    tags.iter()
        .map(|tag| {
            let purged = invalidator.invalidate_tag(tag);
            tracing::info!(tag = %tag, purged, "invalidated cache tag");
            purged
        })
        .sum()
}

#[derive(Default)]
struct TagList {
    seen: HashSet<CacheTag>,
    tags: Vec<CacheTag>,
}

impl TagList {
    fn push(&mut self, tag: CacheTag) {
        if self.seen.insert(tag.clone()) {
            self.tags.push(tag);
        }
    }
}

/// Tags for the manual endpoint.
///
/// Each requested tag (or the defaults when none are given) expands to itself
/// plus one copy per book in `scope`.
pub fn resolve_manual_tags(scope: Scope, requested: &[String]) -> Vec<CacheTag> {
    let requested: Vec<CacheTag> = requested
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(CacheTag::new)
        .collect();
    let base = if requested.is_empty() {
        DEFAULT_TAG_KINDS.into_iter().map(CacheTag::kind).collect()
    } else {
        requested
    };

    let mut out = TagList::default();
    for tag in base {
        out.push(tag.clone());
        for book in scope.books() {
            out.push(tag.with_book(book));
        }
    }
    out.tags
}

/// Tags for a push touching `paths`.
///
/// Every touched book contributes its full `songs`/`titles`/`content` closure,
/// and every touched song file its `song` tags. When no known book directory
/// is touched the unscoped coarse tags are returned instead.
pub fn resolve_push_tags<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<CacheTag> {
    let mut touched: Vec<Book> = Vec::new();
    let mut songs: Vec<(Book, String)> = Vec::new();

    for path in paths {
        let Some(book) = Book::from_path(path) else {
            continue;
        };
        if !touched.contains(&book) {
            touched.push(book);
        }
        let file = &path[book.code().len() + 1..];
        if !file.contains('/') {
            if let Some(number) = strip_document_extension(file) {
                songs.push((book, number.to_string()));
            }
        }
    }

    let mut out = TagList::default();
    if touched.is_empty() {
        for kind in DEFAULT_TAG_KINDS {
            out.push(CacheTag::kind(kind));
        }
        return out.tags;
    }

    touched.sort();
    for book in touched {
        for kind in DEFAULT_TAG_KINDS {
            out.push(CacheTag::kind(kind));
            out.push(CacheTag::scoped(kind, book));
        }
    }
    for (book, number) in songs {
        for tag in song_tags(book, &number) {
            out.push(tag);
        }
    }
    out.tags
}
