use std::{
    collections::{BTreeMap, HashMap},
    panic::AssertUnwindSafe,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    Error,
    error::Result,
    management::{clock::Clock, snapshot::SnapshotStore},
    types::{Book, TitleEntry},
};

pub const STORAGE_KEY: &str = "titles-cache-v1";
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// `"<book>/<number>"` -> cleaned title.
pub type TitlesMap = BTreeMap<String, String>;

/// Errors are shared between every caller waiting on the same request.
pub type SharedResult<T> = std::result::Result<T, Arc<Error>>;

type Pending = Shared<BoxFuture<'static, SharedResult<TitlesMap>>>;

/// Where title listings come from on a cache miss.
#[async_trait]
pub trait TitleSource: Send + Sync {
    async fn list_titles(&self, book: Book) -> Result<Vec<TitleEntry>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    /// Capture time, unix millis.
    ts: i64,
    data: BTreeMap<Book, TitlesMap>,
}

pub fn titles_map(titles: &[TitleEntry]) -> TitlesMap {
    titles
        .iter()
        .map(|t| (format!("{}/{}", t.book, t.number), t.title.clone()))
        .collect()
}

struct Inner {
    source: Arc<dyn TitleSource>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    in_flight: Mutex<HashMap<Book, Pending>>,
}

/// Per-book title index with request de-duplication and a TTL snapshot.
///
/// Lookups resolve in three tiers: a request already in flight for the book,
/// then a snapshot younger than the TTL, then the [`TitleSource`]. Cloning is
/// cheap and every clone shares the same state.
#[derive(Clone)]
pub struct TitleCache {
    inner: Arc<Inner>,
}

impl TitleCache {
    /// Cache with the default one hour TTL.
    pub fn new(
        source: Arc<dyn TitleSource>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_ttl(source, store, clock, DEFAULT_TTL)
    }

    pub fn with_ttl(
        source: Arc<dyn TitleSource>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                store,
                clock,
                ttl,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Titles of `book` keyed `"<book>/<number>"`.
    ///
    /// Concurrent calls for one book share a single request to the source. A
    /// successful fetch is merged into the snapshot; a failed one leaves the
    /// snapshot untouched, so the next call tries the source again.
    ///
    /// # Errors
    ///
    /// The source's error, shared by every waiter, or [`Error::Task`] if the
    /// fetch panicked or its task was cancelled.
    ///
    /// # Example
    ///
    /// ```
    /// let cache = TitleCache::new(source, Arc::new(MemorySnapshotStore::new()), Arc::new(SystemClock));
    /// let titles = cache.load_titles(Book::Be).await?;
    /// println!("{:?}", titles.get("be/57"));
    /// ```
    pub async fn load_titles(&self, book: Book) -> SharedResult<TitlesMap> {
        let pending = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(&book) {
                Some(pending) => pending.clone(),
                None => {
                    if let Some(map) = self.inner.read_fresh(book).await {
                        return Ok(map);
                    }

                    // spawned so the in-flight entry is cleared even if every waiter goes away
                    let inner = Arc::clone(&self.inner);
                    let task = tokio::spawn(async move {
                        let fetch = AssertUnwindSafe(inner.fetch_and_persist(book));
                        match fetch.catch_unwind().await {
                            Ok(result) => result,
                            Err(_) => {
                                inner.in_flight.lock().await.remove(&book);
                                tracing::error!(book = %book, "title fetch panicked");
                                Err(Arc::new(Error::Task(format!(
                                    "title fetch for {} panicked",
                                    book
                                ))))
                            }
                        }
                    });
                    let pending = async move {
                        task.await.unwrap_or_else(|e| {
                            tracing::error!(book = %book, error = %e, "title fetch task did not finish");
                            Err(Arc::new(Error::Task(e.to_string())))
                        })
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(book, pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    /// Warms every other book in the background. Errors are dropped.
    pub fn prefetch_other_books(&self, current: Book) -> Vec<JoinHandle<()>> {
        Book::ALL
            .into_iter()
            .filter(|book| *book != current)
            .map(|book| {
                let cache = self.clone();
                tokio::spawn(async move {
                    if let Err(e) = cache.load_titles(book).await {
                        tracing::debug!(book = %book, error = %e, "title prefetch failed");
                    }
                })
            })
            .collect()
    }

    /// Drops one book from the snapshot so the next load refetches it.
    pub async fn invalidate(&self, book: Book) {
        let Some(mut snapshot) = self.inner.read_snapshot().await else {
            return;
        };
        if snapshot.data.remove(&book).is_some() {
            self.inner.write_snapshot(&snapshot).await;
        }
    }

    /// Removes the whole snapshot.
    pub async fn clear(&self) {
        self.inner.store.remove().await;
    }
}

impl Inner {
    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        let age = self.clock.now_millis() - snapshot.ts;
        age <= self.ttl.as_millis() as i64
    }

    async fn read_snapshot(&self) -> Option<Snapshot> {
        let raw = self.store.read().await?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable title snapshot");
                None
            }
        }
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) {
        match serde_json::to_string(snapshot) {
            Ok(raw) => self.store.write(raw).await,
            Err(e) => tracing::warn!(error = %e, "cannot serialize title snapshot"),
        }
    }

    async fn read_fresh(&self, book: Book) -> Option<TitlesMap> {
        let snapshot = self.read_snapshot().await?;
        if !self.is_fresh(&snapshot) {
            return None;
        }
        snapshot.data.get(&book).cloned()
    }

    /// Read-merge-write of the whole snapshot. The capture time is only kept
    /// when the existing snapshot is still fresh.
    async fn persist(&self, book: Book, map: TitlesMap) {
        let next = match self.read_snapshot().await {
            Some(mut existing) if self.is_fresh(&existing) => {
                existing.data.insert(book, map);
                existing
            }
            _ => Snapshot {
                ts: self.clock.now_millis(),
                data: BTreeMap::from([(book, map)]),
            },
        };
        self.write_snapshot(&next).await;
    }

    async fn fetch_and_persist(&self, book: Book) -> SharedResult<TitlesMap> {
        let result = self
            .source
            .list_titles(book)
            .await
            .map(|titles| titles_map(&titles));
        if let Ok(map) = &result {
            self.persist(book, map.clone()).await;
        }
        self.in_flight.lock().await.remove(&book);
        result.map_err(Arc::new)
    }
}

#[derive(Deserialize)]
struct TitlesResponse {
    titles: Vec<TitleEntry>,
}

/// Reads titles from the `/api/titles` endpoint of a running server.
#[derive(Debug, Clone)]
pub struct ApiTitleSource {
    http: reqwest::Client,
    base_url: String,
}

impl ApiTitleSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TitleSource for ApiTitleSource {
    async fn list_titles(&self, book: Book) -> Result<Vec<TitleEntry>> {
        let url = format!("{}/api/titles?type={}", self.base_url, book);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<TitlesResponse>().await?.titles)
    }
}
