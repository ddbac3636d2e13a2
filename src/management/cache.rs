use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{
    error::Result,
    management::{
        clock::{Clock, SystemClock},
        tags::{CacheTag, TagInvalidator},
    },
};

/// How long a cached value may be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    pub fresh_for: Duration,
    pub stale_for: Duration,
}

impl Freshness {
    pub const LISTING: Freshness = Freshness::new(900, 86_400);
    pub const TITLES: Freshness = Freshness::new(3_600, 86_400);
    pub const SONG: Freshness = Freshness::new(900, 900);
    pub const CONTENT: Freshness = Freshness::new(900, 86_400);

    pub const fn new(fresh_secs: u64, stale_secs: u64) -> Self {
        Self {
            fresh_for: Duration::from_secs(fresh_secs),
            stale_for: Duration::from_secs(stale_secs),
        }
    }

    /// `Cache-Control` value advertising this window to downstream caches.
    pub fn cache_control(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.fresh_for.as_secs(),
            self.stale_for.as_secs()
        )
    }
}

/// `Cache-Control` for degraded responses that must not be kept.
pub const NO_STORE: &str = "no-store";

struct Entry {
    tags: Vec<CacheTag>,
    value: Arc<dyn Any + Send + Sync>,
    produced_at: DateTime<Utc>,
    freshness: Freshness,
}

enum Lookup<T> {
    Fresh(T),
    Stale(T),
    Miss,
}

/// Tag-addressed store for upstream responses.
///
/// The subsystem never edits entries directly: values enter through
/// [`ResponseCache::get_or_fetch`] and leave through
/// [`TagInvalidator::invalidate_tag`] or expiry.
///
/// Every tag carries a generation that invalidation bumps. A fetch that was
/// started before an invalidation of one of its tags hands its value to the
/// caller but does not store it.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Entry>>,
    /// Lock order: `generations` before `entries`.
    generations: Mutex<HashMap<CacheTag, u64>>,
    clock: Arc<dyn Clock>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ResponseCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            generations: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // a panic while holding the lock cannot leave an entry half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn generations(&self) -> MutexGuard<'_, HashMap<CacheTag, u64>> {
        self.generations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn generations_of(generations: &HashMap<CacheTag, u64>, tags: &[CacheTag]) -> Vec<u64> {
        tags.iter()
            .map(|tag| generations.get(tag).copied().unwrap_or(0))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    fn lookup<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Lookup<T> {
        let mut entries = self.entries();
        let Some(entry) = entries.get(key) else {
            return Lookup::Miss;
        };

        let age = (self.clock.now() - entry.produced_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let fresh = age < entry.freshness.fresh_for;
        let usable = age < entry.freshness.fresh_for + entry.freshness.stale_for;

        match entry.value.downcast_ref::<T>().cloned() {
            Some(value) if fresh => Lookup::Fresh(value),
            Some(value) if usable => Lookup::Stale(value),
            _ => {
                entries.remove(key);
                Lookup::Miss
            }
        }
    }

    /// Inserts unless one of `tags` was invalidated since `seen` was taken.
    fn store<T: Send + Sync + 'static>(
        &self,
        key: &str,
        tags: &[CacheTag],
        seen: &[u64],
        freshness: Freshness,
        value: T,
    ) -> bool {
        let generations = self.generations();
        if Self::generations_of(&generations, tags) != seen {
            return false;
        }
        self.entries().insert(
            key.to_string(),
            Entry {
                tags: tags.to_vec(),
                value: Arc::new(value),
                produced_at: self.clock.now(),
                freshness,
            },
        );
        true
    }

    /// Serves `key` from cache or runs `fetch` and stores its result under `tags`.
    ///
    /// A stale entry is only handed out when the refetch fails transiently.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        tags: &[CacheTag],
        freshness: Freshness,
        fetch: F,
    ) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let stale = match self.lookup::<T>(key) {
            Lookup::Fresh(value) => {
                tracing::debug!(key, "cache hit");
                return Ok(value);
            }
            Lookup::Stale(value) => Some(value),
            Lookup::Miss => None,
        };
        tracing::debug!(key, stale = stale.is_some(), "cache miss");

        let seen = Self::generations_of(&self.generations(), tags);
        match fetch().await {
            Ok(value) => {
                if !self.store(key, tags, &seen, freshness, value.clone()) {
                    tracing::debug!(key, "invalidated while fetching, not storing");
                }
                Ok(value)
            }
            Err(err) if err.is_transient() => match stale {
                Some(value) => {
                    tracing::warn!(key, error = %err, "serving stale entry");
                    Ok(value)
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }
}

impl TagInvalidator for ResponseCache {
    fn invalidate_tag(&self, tag: &CacheTag) -> usize {
        let mut generations = self.generations();
        *generations.entry(tag.clone()).or_insert(0) += 1;
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.contains(tag));
        before - entries.len()
    }
}
