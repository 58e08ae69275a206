pub mod candidates;
pub mod catalog;
pub mod catalog_store;
pub mod profile;
pub mod providers;
pub mod ranker;
pub mod recommendations;
pub mod refresh;
pub mod tfidf;

pub use catalog_store::{CatalogReader, CatalogStore};
pub use refresh::{RefreshHandle, RefreshScheduler};
