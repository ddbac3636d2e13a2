use std::sync::Arc;

use crate::{
    config::Settings,
    error::Result,
    github::{Contents, StoreClient},
    management::{Catalog, ResponseCache},
    search::{SearchEngine, Suggester},
};

/// Shared by every handler through an axum `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub search: SearchEngine,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = StoreClient::new(settings.store.clone())?;
        let contents = Contents::new(client, settings.title_concurrency);
        let catalog = Catalog::new(contents, Arc::new(ResponseCache::default()));
        Ok(Self::with_catalog(catalog, settings))
    }

    pub fn with_catalog(catalog: Catalog, settings: Settings) -> Self {
        let search = SearchEngine::new(catalog.clone(), settings.search.clone());
        Self {
            catalog,
            search,
            settings: Arc::new(settings),
        }
    }

    /// A fresh suggestion session.
    pub fn suggester(&self) -> Suggester {
        Suggester::new(self.catalog.clone(), self.search.clone())
    }
}
