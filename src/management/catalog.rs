use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::Result,
    github::Contents,
    management::{
        cache::{Freshness, ResponseCache},
        tags::{content_tags, song_tags, songs_tags, titles_tags},
        titles::TitleSource,
    },
    types::{Book, SongDocument, SongRef, TitleEntry},
    utils::strip_document_extension,
};

/// Content accessors with every call wrapped in a tagged cache entry.
///
/// Listings, single songs and titles are tagged `songs`, `song` and `titles`.
/// The search scan reads through separate `content` entries so that it can be
/// invalidated independently of what the song pages show.
#[derive(Clone)]
pub struct Catalog {
    contents: Contents,
    cache: Arc<ResponseCache>,
}

impl Catalog {
    /// Wraps `contents` with `cache`. Clones share both.
    pub fn new(contents: Contents, cache: Arc<ResponseCache>) -> Self {
        Self { contents, cache }
    }

    /// The cache the invalidation triggers purge.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Song files of `book`, cached under `songs/<book>` for [`Freshness::LISTING`].
    ///
    /// # Errors
    ///
    /// The errors of [`Contents::list_songs`]. A transient failure is hidden
    /// when a stale listing is still within its window.
    pub async fn list_songs(&self, book: Book) -> Result<Vec<SongRef>> {
        self.cache
            .get_or_fetch(
                &format!("songs/{}", book),
                &songs_tags(book),
                Freshness::LISTING,
                || self.contents.list_songs(book),
            )
            .await
    }

    /// One song, cached under `song/<book>/<number>` for [`Freshness::SONG`].
    ///
    /// `number` may carry the `.json` extension; both spellings share an entry.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotFound`] for a missing or invalid number, otherwise the
    /// errors of [`Contents::get_song`].
    pub async fn get_song(&self, book: Book, number: &str) -> Result<SongDocument> {
        let number = strip_document_extension(number).unwrap_or(number);
        self.cache
            .get_or_fetch(
                &format!("song/{}/{}", book, number),
                &song_tags(book, number),
                Freshness::SONG,
                || self.contents.get_song(book, number),
            )
            .await
    }

    /// Title index of `book`, cached under `titles/<book>` for [`Freshness::TITLES`].
    ///
    /// # Errors
    ///
    /// The errors of [`Contents::list_titles`].
    pub async fn list_titles(&self, book: Book) -> Result<Vec<TitleEntry>> {
        self.cache
            .get_or_fetch(
                &format!("titles/{}", book),
                &titles_tags(book),
                Freshness::TITLES,
                || self.contents.list_titles(book),
            )
            .await
    }

    /// Song listing as seen by the search scan.
    pub async fn scan_listing(&self, book: Book) -> Result<Vec<SongRef>> {
        self.cache
            .get_or_fetch(
                &format!("content/{}", book),
                &content_tags(book),
                Freshness::CONTENT,
                || self.contents.list_songs(book),
            )
            .await
    }

    /// One document as seen by the search scan.
    pub async fn scan_song(&self, song: &SongRef) -> Result<SongDocument> {
        self.cache
            .get_or_fetch(
                &format!("content/{}", song.storage_path),
                &content_tags(song.book),
                Freshness::CONTENT,
                || self.contents.get_song_at(&song.storage_path),
            )
            .await
    }
}

#[async_trait]
impl TitleSource for Catalog {
    async fn list_titles(&self, book: Book) -> Result<Vec<TitleEntry>> {
        Catalog::list_titles(self, book).await
    }
}
