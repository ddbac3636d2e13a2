use crate::{
    Error,
    error::Result,
    github::StoreClient,
    types::{Book, EntryKind, SongDocument, SongRef, TitleEntry},
    utils::{compare_song_numbers, is_song_number, run_windowed, strip_document_extension},
};

/// Book-scoped accessors over the raw store client.
#[derive(Debug, Clone)]
pub struct Contents {
    client: StoreClient,
    title_concurrency: usize,
}

impl Contents {
    pub fn new(client: StoreClient, title_concurrency: usize) -> Self {
        Self {
            client,
            title_concurrency: title_concurrency.max(1),
        }
    }

    /// Lists the song files of a book.
    ///
    /// Directories, non-`.json` files and file names that are not a plain song
    /// number are skipped.
    pub async fn list_songs(&self, book: Book) -> Result<Vec<SongRef>> {
        let entries = self.client.list_directory(book.code()).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .filter_map(|entry| {
                let number = strip_document_extension(&entry.name).filter(|n| is_song_number(n))?;
                let number = number.to_string();
                Some(SongRef {
                    book,
                    number,
                    storage_path: entry.path,
                })
            })
            .collect())
    }

    /// Fetches one song; `number` may carry the `.json` extension already.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] without any request when `number` is not a
    /// plain song number (see [`is_song_number`]), and whatever
    /// [`Contents::get_song_at`] returns otherwise.
    pub async fn get_song(&self, book: Book, number: &str) -> Result<SongDocument> {
        let stem = strip_document_extension(number).unwrap_or(number);
        if !is_song_number(stem) {
            tracing::warn!(book = %book, number, "rejecting song number");
            return Err(Error::NotFound(format!("{}/{}", book.code(), number)));
        }
        self.get_song_at(&format!("{}/{}.json", book.code(), stem)).await
    }

    /// Fetches and validates the document at a storage path taken from a listing.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing file, [`Error::MalformedContent`]
    /// when the bytes are not a valid song document, and the transport or
    /// upstream errors of [`StoreClient::get_file`].
    pub async fn get_song_at(&self, path: &str) -> Result<SongDocument> {
        let bytes = self.client.get_file(path).await?;
        SongDocument::parse(path, &bytes)
    }

    /// Title of every song in `book`, ordered by song number.
    ///
    /// A document that fails validation is listed under its bare number rather
    /// than failing the whole index.
    pub async fn list_titles(&self, book: Book) -> Result<Vec<TitleEntry>> {
        let songs = self.list_songs(book).await?;

        let results = run_windowed(songs, self.title_concurrency, |song| async move {
            let title = match self.get_song_at(&song.storage_path).await {
                Ok(doc) => doc.display_title(book, &song.number),
                Err(err @ Error::MalformedContent { .. }) => {
                    tracing::warn!(path = %song.storage_path, error = %err, "listing song under its number");
                    song.number.clone()
                }
                Err(err) => return Err(err),
            };
            Ok(TitleEntry {
                book,
                number: song.number,
                title,
            })
        })
        .await;

        let mut titles = results.into_iter().collect::<Result<Vec<_>>>()?;
        titles.sort_by(|a, b| compare_song_numbers(&a.number, &b.number));
        Ok(titles)
    }
}
