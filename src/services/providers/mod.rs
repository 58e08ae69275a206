/// External collaborators of the recommendation engine
///
/// The engine itself is synchronous and pure. Everything that touches the
/// network or storage sits behind one of these traits so it can be swapped
/// (or faked in tests) without touching the core.
use crate::{
    error::AppResult,
    models::{Catalog, Problem, RawProblem, UserHistory},
};

pub mod codeforces;

pub use codeforces::CodeforcesClient;

/// Source of a user's rating and submission history
///
/// Implementations never fail: on transport or upstream errors they log and
/// return whatever they managed to get, possibly an empty history.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserHistoryProvider: Send + Sync {
    async fn fetch(&self, handle: &str) -> UserHistory;
}

/// Source of the judge's full problem listing
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Raw, not yet normalized problem records
    async fn fetch_all(&self) -> AppResult<Vec<RawProblem>>;
}

/// Durable storage for the last good catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn load_persisted(&self) -> AppResult<Vec<Problem>>;

    /// Replaces the stored catalog as a whole
    async fn persist(&self, catalog: &Catalog) -> AppResult<()>;
}
