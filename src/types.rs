use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// A hymnal volume. Its code doubles as the directory name in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Book {
    Be,
    Bn,
    Kj,
}

impl Book {
    pub const ALL: [Book; 3] = [Book::Be, Book::Bn, Book::Kj];

    pub fn code(&self) -> &'static str {
        match self {
            Book::Be => "be",
            Book::Bn => "bn",
            Book::Kj => "kj",
        }
    }

    pub fn display_code(&self) -> &'static str {
        match self {
            Book::Be => "BE",
            Book::Bn => "BN",
            Book::Kj => "KJ",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Book::Be => "Buku Ende",
            Book::Bn => "Buku Nyanyian",
            Book::Kj => "Kidung Jemaat",
        }
    }

    /// Finds the book whose directory prefixes `path` (e.g. `be/57.json`).
    pub fn from_path(path: &str) -> Option<Book> {
        Book::ALL.into_iter().find(|book| {
            path.strip_prefix(book.code())
                .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Book {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "be" => Ok(Book::Be),
            "bn" => Ok(Book::Bn),
            "kj" => Ok(Book::Kj),
            other => Err(format!("unknown book '{}', expected one of: be, bn, kj", other)),
        }
    }
}

/// Either a single book or every known book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    Book(Book),
    #[default]
    All,
}

impl Scope {
    pub fn books(&self) -> Vec<Book> {
        match self {
            Scope::Book(book) => vec![*book],
            Scope::All => Book::ALL.to_vec(),
        }
    }

    /// Lenient parse: anything that isn't a known book means `All`.
    pub fn parse_lenient(value: Option<&str>) -> Scope {
        value
            .and_then(|v| v.parse::<Book>().ok())
            .map(Scope::Book)
            .unwrap_or(Scope::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One item of a remote directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    pub path: String,
}

/// Identifies one song file in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRef {
    #[serde(rename = "type")]
    pub book: Book,
    #[serde(rename = "name")]
    pub number: String,
    #[serde(rename = "path")]
    pub storage_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StanzaKind {
    #[serde(rename = "bait")]
    Verse,
    #[serde(rename = "reff")]
    Refrain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stanza {
    #[serde(rename = "type")]
    pub kind: StanzaKind,
    pub label: Option<String>,
    #[serde(rename = "bait_no")]
    pub number: Option<String>,
    #[serde(rename = "baris", default)]
    pub lines: Vec<String>,
}

/// A song as stored upstream. Field names follow the repository's JSON schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDocument {
    #[serde(rename = "judul", default)]
    pub title: String,
    #[serde(rename = "judul_asli", default, skip_serializing_if = "Option::is_none")]
    pub alternate_title: Option<String>,
    #[serde(rename = "nada_dasar", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "bait")]
    pub stanzas: Vec<Stanza>,
}

impl SongDocument {
    /// Parses and validates a raw document. `path` is only used for error context.
    pub fn parse(path: &str, bytes: &[u8]) -> crate::error::Result<Self> {
        let doc: SongDocument =
            serde_json::from_slice(bytes).map_err(|e| crate::Error::malformed(path, e))?;
        doc.validate(path)?;
        Ok(doc)
    }

    fn validate(&self, path: &str) -> crate::error::Result<()> {
        for (idx, stanza) in self.stanzas.iter().enumerate() {
            let ok = match stanza.kind {
                StanzaKind::Refrain => stanza.label.is_some() && stanza.number.is_none(),
                StanzaKind::Verse => stanza.number.is_some() && stanza.label.is_none(),
            };
            if !ok {
                return Err(crate::Error::malformed(
                    path,
                    format!("stanza {} has inconsistent label/number for its kind", idx),
                ));
            }
        }
        Ok(())
    }

    /// Title, then alternate title, then the bare song number.
    pub fn display_title(&self, book: Book, number: &str) -> String {
        if !self.title.trim().is_empty() {
            return crate::utils::clean_title(book, &self.title);
        }
        match self.alternate_title.as_deref() {
            Some(alt) if !alt.trim().is_empty() => alt.to_string(),
            _ => number.to_string(),
        }
    }

    /// Searchable text: title, alternate title, then every stanza line.
    /// Empty fields are left out.
    pub fn fields(&self) -> Vec<&str> {
        std::iter::once(self.title.as_str())
            .chain(self.alternate_title.as_deref())
            .chain(
                self.stanzas
                    .iter()
                    .flat_map(|s| s.lines.iter().map(String::as_str)),
            )
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// [`SongDocument::fields`] joined by newlines.
    pub fn haystack(&self) -> String {
        self.fields().join("\n")
    }
}

/// One row of a book's title index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleEntry {
    #[serde(rename = "type")]
    pub book: Book,
    #[serde(rename = "name")]
    pub number: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub book: Book,
    #[serde(rename = "name")]
    pub number: String,
    pub title: String,
    pub snippet: String,
}

/// Address-bar suggestion payload: `[query, labels, descriptions, targets]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions(pub String, pub Vec<String>, pub Vec<String>, pub Vec<String>);

impl Suggestions {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into(), Vec::new(), Vec::new(), Vec::new())
    }

    pub fn push(&mut self, label: String, description: String, target: String) {
        self.1.push(label);
        self.2.push(description);
        self.3.push(target);
    }

    pub fn query(&self) -> &str {
        &self.0
    }

    pub fn labels(&self) -> &[String] {
        &self.1
    }

    pub fn descriptions(&self) -> &[String] {
        &self.2
    }

    pub fn targets(&self) -> &[String] {
        &self.3
    }

    pub fn len(&self) -> usize {
        self.1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.1.is_empty()
    }
}

#[derive(Tabled)]
pub struct SongTableRow {
    pub book: String,
    pub number: String,
    pub path: String,
}

#[derive(Tabled)]
pub struct TitleTableRow {
    pub number: String,
    pub title: String,
}

#[derive(Tabled)]
pub struct HitTableRow {
    pub song: String,
    pub title: String,
    pub snippet: String,
}

#[derive(Tabled)]
pub struct SuggestionTableRow {
    pub label: String,
    pub description: String,
    pub target: String,
}
