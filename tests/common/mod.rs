#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeZone, Utc};
use httpmock::{Method::GET, Mock, MockServer};
use hymnsync::{
    Error,
    config::Settings,
    error::Result,
    github::{Contents, RetryPolicy, StoreClient, StoreConfig},
    management::{Catalog, Clock, ResponseCache, TitleSource},
    search::SearchSettings,
    types::{Book, TitleEntry},
};
use serde_json::{Value, json};

pub const REPO: &str = "owner/hymns";
pub const TOKEN: &str = "test-token";

pub fn contents_path(path: &str) -> String {
    format!("/repos/{}/contents/{}", REPO, path)
}

pub fn store_config(server: &MockServer) -> StoreConfig {
    StoreConfig {
        api_url: server.base_url(),
        repo: REPO.to_string(),
        token: Some(TOKEN.to_string()),
        timeout: Duration::from_secs(2),
        retry: RetryPolicy::none(),
    }
}

pub fn catalog_with(config: StoreConfig) -> Catalog {
    let client = StoreClient::new(config).unwrap();
    Catalog::new(Contents::new(client, 4), Arc::new(ResponseCache::default()))
}

pub fn catalog(server: &MockServer) -> Catalog {
    catalog_with(store_config(server))
}

pub fn settings(server: &MockServer) -> Settings {
    Settings {
        store: store_config(server),
        revalidate_secret: Some("reval-secret".to_string()),
        webhook_secret: Some("hook-secret".to_string()),
        server_addr: "127.0.0.1:0".to_string(),
        site_url: "https://hymns.example".to_string(),
        search: SearchSettings::default(),
        title_concurrency: 4,
        titles_ttl: Duration::from_secs(3600),
    }
}

/// Directory listing in the contents API shape. A `README.md` and a
/// sub-directory are mixed in to check they are skipped.
pub fn listing(book: Book, numbers: &[&str]) -> Value {
    let mut entries: Vec<Value> = numbers
        .iter()
        .map(|n| {
            json!({
                "type": "file",
                "name": format!("{}.json", n),
                "path": format!("{}/{}.json", book, n),
            })
        })
        .collect();
    entries.push(json!({ "type": "file", "name": "README.md", "path": format!("{}/README.md", book) }));
    entries.push(json!({ "type": "dir", "name": "drafts", "path": format!("{}/drafts", book) }));
    Value::Array(entries)
}

/// File payload with the content wrapped at 60 columns like the real API.
pub fn file_body(doc: &Value) -> Value {
    let encoded = STANDARD.encode(serde_json::to_vec(doc).unwrap());
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    json!({ "content": wrapped, "encoding": "base64" })
}

pub fn song_doc(title: &str, lines: &[&str]) -> Value {
    json!({
        "judul": title,
        "nada_dasar": "Do = G",
        "bait": [
            { "type": "bait", "label": null, "bait_no": "1", "baris": lines },
            { "type": "reff", "label": "Reff", "bait_no": null, "baris": ["Haleluya, haleluya"] }
        ]
    })
}

pub async fn mock_listing<'a>(server: &'a MockServer, book: Book, numbers: &[&str]) -> Mock<'a> {
    let body = listing(book, numbers);
    server
        .mock_async(|when, then| {
            when.method(GET).path(contents_path(book.code()));
            then.status(200).json_body(body);
        })
        .await
}

pub async fn mock_song<'a>(server: &'a MockServer, path: &str, doc: Value) -> Mock<'a> {
    let body = file_body(&doc);
    server
        .mock_async(|when, then| {
            when.method(GET).path(contents_path(path));
            then.status(200).json_body(body);
        })
        .await
}

pub async fn mock_status<'a>(server: &'a MockServer, path: &str, status: u16) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(contents_path(path));
            then.status(status).body("upstream says no");
        })
        .await
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicI64::new(1_700_000_000_000),
        })
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
            .unwrap()
    }
}

/// Title source that counts calls and answers after a short delay.
pub struct CountingSource {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub delay: Duration,
}

impl CountingSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
            delay: Duration::from_millis(50),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
            delay: Duration::from_millis(10),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TitleSource for CountingSource {
    async fn list_titles(&self, book: Book) -> Result<Vec<TitleEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(Error::Upstream {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(vec![
            TitleEntry {
                book,
                number: "1".into(),
                title: format!("{} first", book.display_code()),
            },
            TitleEntry {
                book,
                number: "2".into(),
                title: format!("{} second", book.display_code()),
            },
        ])
    }
}
