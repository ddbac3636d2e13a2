//! Caching and invalidation policy.
//!
//! - [`cache`] holds the tag-addressed response store and freshness windows.
//! - [`catalog`] wraps the content accessors so every call is cached under its tags.
//! - [`tags`] defines the tags and computes which ones a trigger must purge.
//! - [`titles`] is the client-side title index with request de-duplication.

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod snapshot;
pub mod tags;
pub mod titles;

pub use cache::{Freshness, NO_STORE, ResponseCache};
pub use catalog::Catalog;
pub use clock::{Clock, SystemClock};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use tags::{CacheTag, TagInvalidator, TagKind};
pub use titles::{ApiTitleSource, TitleCache, TitleSource, TitlesMap};
