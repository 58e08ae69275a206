use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::Catalog;

/// An immutable, published version of the problem catalog
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    pub catalog: Catalog,
    /// `None` until the first catalog is published
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Owner of the current catalog snapshot
///
/// Only the holder of a `CatalogStore` can publish. Request handlers get a
/// `CatalogReader`, which can only take snapshots. Publishing swaps the `Arc`
/// under a write lock; readers holding an older snapshot keep using it untouched.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    current: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

/// Read-only handle onto a `CatalogStore`
#[derive(Debug, Clone)]
pub struct CatalogReader {
    current: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader(&self) -> CatalogReader {
        CatalogReader {
            current: Arc::clone(&self.current),
        }
    }

    /// Publishes `catalog` as refreshed now
    pub async fn publish(&self, catalog: Catalog) {
        self.publish_at(catalog, Utc::now()).await;
    }

    pub async fn publish_at(&self, catalog: Catalog, refreshed_at: DateTime<Utc>) {
        let snapshot = Arc::new(CatalogSnapshot {
            catalog,
            refreshed_at: Some(refreshed_at),
        });
        let problem_count = snapshot.catalog.len();

        *self.current.write().await = snapshot;

        tracing::info!(problems = problem_count, "Published catalog snapshot");
    }

    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&*self.current.read().await)
    }
}

impl CatalogReader {
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&*self.current.read().await)
    }
}
