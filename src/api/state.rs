use std::sync::Arc;

use crate::services::{catalog_store::CatalogReader, providers::UserHistoryProvider};

/// Shared application state
///
/// Handlers only ever read the catalog; the refresh scheduler owns the
/// matching `CatalogStore`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogReader,
    pub history: Arc<dyn UserHistoryProvider>,
}

impl AppState {
    pub fn new(catalog: CatalogReader, history: Arc<dyn UserHistoryProvider>) -> Self {
        Self { catalog, history }
    }
}
