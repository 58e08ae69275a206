use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::{
    models::Catalog,
    services::{
        catalog::normalize_catalog,
        catalog_store::{CatalogSnapshot, CatalogStore},
        providers::{CatalogProvider, CatalogRepository},
    },
};

/// Default time between catalog refreshes (6 hours)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
/// Tolerance for timer wake-up jitter when comparing tick times
const TICK_SLACK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot with this many problems was published
    Refreshed(usize),
    /// The fetch succeeded but produced no usable problems
    Empty,
    Failed,
}

/// Keeps the published catalog fresh
///
/// Owns the write side of the catalog store. Failed or empty fetches never
/// replace the current snapshot; they are retried on the next tick.
pub struct RefreshScheduler {
    provider: Arc<dyn CatalogProvider>,
    repository: Arc<dyn CatalogRepository>,
    store: CatalogStore,
    interval: Duration,
}

/// Running refresh loop
pub struct RefreshHandle {
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signals the loop to stop and waits for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "Catalog refresh task ended abnormally");
        }
        tracing::info!("Catalog refresh stopped");
    }
}

impl RefreshScheduler {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        repository: Arc<dyn CatalogRepository>,
        store: CatalogStore,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            repository,
            store,
            interval,
        }
    }

    /// Publishes the persisted catalog, or fetches one if nothing is stored
    pub async fn bootstrap(&self) -> RefreshOutcome {
        match self.repository.load_persisted().await {
            Ok(problems) if !problems.is_empty() => {
                let catalog: Catalog = problems.into_iter().collect();
                let count = catalog.len();
                tracing::info!(problems = count, "Loaded persisted catalog");
                self.store.publish(catalog).await;
                return RefreshOutcome::Refreshed(count);
            }
            Ok(_) => tracing::info!("No persisted catalog, fetching from provider"),
            Err(e) => tracing::warn!(error = %e, "Failed to load persisted catalog"),
        }

        self.refresh_once().await
    }

    /// Fetches, normalizes, publishes and persists the catalog once
    pub async fn refresh_once(&self) -> RefreshOutcome {
        self.refresh_at(Utc::now()).await
    }

    /// Like `refresh_once`, stamping the snapshot with `started_at`
    ///
    /// The stamp is taken before the fetch so that the time spent fetching
    /// and persisting does not push back the next refresh.
    pub async fn refresh_at(&self, started_at: DateTime<Utc>) -> RefreshOutcome {
        let raw = match self.provider.fetch_all().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Catalog fetch failed, keeping current snapshot");
                return RefreshOutcome::Failed;
            }
        };

        let catalog = normalize_catalog(raw);
        if catalog.is_empty() {
            tracing::warn!("Catalog fetch returned no usable problems, keeping current snapshot");
            return RefreshOutcome::Empty;
        }

        let count = catalog.len();
        if let Err(e) = self.repository.persist(&catalog).await {
            tracing::error!(error = %e, "Failed to persist catalog");
        }
        self.store.publish_at(catalog, started_at).await;

        RefreshOutcome::Refreshed(count)
    }

    /// Spawns the polling loop
    ///
    /// Ticks every half interval and refreshes once the current snapshot is
    /// at least one full interval old (or missing).
    pub fn start(self) -> RefreshHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let join = tokio::spawn(async move {
            let mut ticker = time::interval(poll_period(self.interval));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(interval_secs = self.interval.as_secs(), "Catalog refresh started");

            'poll: loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = Utc::now();
                        let snapshot = self.store.snapshot().await;
                        if !is_due(&snapshot, now, self.interval) {
                            continue;
                        }
                        // a slow fetch or persist must not hold up shutdown
                        tokio::select! {
                            outcome = self.refresh_at(now) => {
                                tracing::debug!(?outcome, "Catalog refresh tick");
                            }
                            _ = &mut shutdown_rx => {
                                tracing::info!("Shutdown requested during catalog refresh, abandoning it");
                                break 'poll;
                            }
                        }
                    }
                    _ = &mut shutdown_rx => break 'poll,
                }
            }
        });

        RefreshHandle { shutdown_tx, join }
    }
}

fn poll_period(interval: Duration) -> Duration {
    (interval / 2).max(Duration::from_secs(1))
}

/// Whether the snapshot needs replacing at `now`
///
/// Ticks may wake slightly early relative to the previous one, so an age
/// within `TICK_SLACK` of the interval already counts.
pub fn is_due(snapshot: &CatalogSnapshot, now: DateTime<Utc>, interval: Duration) -> bool {
    match snapshot.refreshed_at {
        None => true,
        Some(at) => match (now - at).to_std() {
            Ok(elapsed) => elapsed + TICK_SLACK >= interval,
            // refreshed in the future: clock went backwards
            Err(_) => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{AppError, AppResult},
        models::{Problem, RawProblem},
        services::providers::{MockCatalogProvider, MockCatalogRepository},
    };
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw(contest: i64, index: &str) -> RawProblem {
        serde_json::from_value(json!({
            "contestId": contest,
            "index": index,
            "name": format!("{}{}", contest, index),
            "rating": 1200,
            "tags": ["math"]
        }))
        .unwrap()
    }

    fn problem(id: &str) -> Problem {
        Problem {
            problem_id: id.to_string(),
            problem_name: id.to_string(),
            problem_rating: Some(1000),
            problem_tags: vec!["greedy".to_string()],
        }
    }

    fn scheduler(
        provider: MockCatalogProvider,
        repository: MockCatalogRepository,
        store: &CatalogStore,
    ) -> RefreshScheduler {
        RefreshScheduler::new(
            Arc::new(provider),
            Arc::new(repository),
            store.clone(),
            DEFAULT_REFRESH_INTERVAL,
        )
    }

    #[tokio::test]
    async fn test_refresh_publishes_and_persists() {
        let mut provider = MockCatalogProvider::new();
        provider
            .expect_fetch_all()
            .times(1)
            .returning(|| Ok(vec![raw(1, "A"), raw(2, "B"), raw(1, "A")]));

        let mut repository = MockCatalogRepository::new();
        repository
            .expect_persist()
            .withf(|catalog| catalog.len() == 2)
            .times(1)
            .returning(|_| Ok(()));

        let store = CatalogStore::new();
        let outcome = scheduler(provider, repository, &store).refresh_once().await;

        assert_eq!(outcome, RefreshOutcome::Refreshed(2));
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.catalog.len(), 2);
        assert!(snapshot.refreshed_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let mut provider = MockCatalogProvider::new();
        provider
            .expect_fetch_all()
            .returning(|| Err(AppError::ExternalApi("down".to_string())));
        let mut repository = MockCatalogRepository::new();
        repository.expect_persist().times(0);

        let store = CatalogStore::new();
        store.publish(vec![problem("1-A")].into_iter().collect()).await;

        let outcome = scheduler(provider, repository, &store).refresh_once().await;

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert!(store.snapshot().await.catalog.contains("1-A"));
    }

    #[tokio::test]
    async fn test_empty_fetch_keeps_previous_snapshot() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_fetch_all().returning(|| Ok(vec![]));
        let mut repository = MockCatalogRepository::new();
        repository.expect_persist().times(0);

        let store = CatalogStore::new();
        store.publish(vec![problem("1-A")].into_iter().collect()).await;

        let outcome = scheduler(provider, repository, &store).refresh_once().await;

        assert_eq!(outcome, RefreshOutcome::Empty);
        assert_eq!(store.snapshot().await.catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_persist_failure_still_publishes() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_fetch_all().returning(|| Ok(vec![raw(5, "C")]));
        let mut repository = MockCatalogRepository::new();
        repository
            .expect_persist()
            .returning(|_| Err(AppError::Internal("disk full".to_string())));

        let store = CatalogStore::new();
        let outcome = scheduler(provider, repository, &store).refresh_once().await;

        assert_eq!(outcome, RefreshOutcome::Refreshed(1));
        assert!(store.snapshot().await.catalog.contains("5-C"));
    }

    #[tokio::test]
    async fn test_bootstrap_prefers_persisted_catalog() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_fetch_all().times(0);
        let mut repository = MockCatalogRepository::new();
        repository
            .expect_load_persisted()
            .returning(|| Ok(vec![problem("1-A"), problem("2-B")]));

        let store = CatalogStore::new();
        let outcome = scheduler(provider, repository, &store).bootstrap().await;

        assert_eq!(outcome, RefreshOutcome::Refreshed(2));
        assert_eq!(store.snapshot().await.catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_bootstrap_fetches_when_nothing_persisted() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_fetch_all().times(1).returning(|| Ok(vec![raw(3, "D")]));
        let mut repository = MockCatalogRepository::new();
        repository.expect_load_persisted().returning(|| Ok(vec![]));
        repository.expect_persist().times(1).returning(|_| Ok(()));

        let store = CatalogStore::new();
        let outcome = scheduler(provider, repository, &store).bootstrap().await;

        assert_eq!(outcome, RefreshOutcome::Refreshed(1));
        assert!(store.snapshot().await.catalog.contains("3-D"));
    }

    #[tokio::test]
    async fn test_failed_bootstrap_leaves_store_empty() {
        let mut provider = MockCatalogProvider::new();
        provider
            .expect_fetch_all()
            .returning(|| Err(AppError::ExternalApi("down".to_string())));
        let mut repository = MockCatalogRepository::new();
        repository
            .expect_load_persisted()
            .returning(|| Err(AppError::Internal("no database".to_string())));

        let store = CatalogStore::new();
        let outcome = scheduler(provider, repository, &store).bootstrap().await;

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert!(store.snapshot().await.refreshed_at.is_none());
    }

    #[tokio::test]
    async fn test_started_loop_refreshes_missing_snapshot_and_stops() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_fetch_all().returning(|| Ok(vec![raw(7, "E")]));
        let mut repository = MockCatalogRepository::new();
        repository.expect_persist().returning(|_| Ok(()));

        let store = CatalogStore::new();
        let handle = scheduler(provider, repository, &store).start();

        let mut published = false;
        for _ in 0..50 {
            if !store.snapshot().await.catalog.is_empty() {
                published = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        handle.stop().await;
        assert!(published);
    }

    #[test]
    fn test_is_due() {
        let interval = Duration::from_secs(6 * 60 * 60);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let snapshot = CatalogSnapshot {
            catalog: Catalog::default(),
            refreshed_at: Some(at),
        };

        assert!(is_due(&CatalogSnapshot::default(), at, interval));
        assert!(!is_due(&snapshot, at + chrono::Duration::hours(5), interval));
        assert!(is_due(&snapshot, at + chrono::Duration::hours(6), interval));
        assert!(!is_due(&snapshot, at - chrono::Duration::hours(1), interval));
        assert!(is_due(
            &snapshot,
            at + chrono::Duration::hours(6) - chrono::Duration::milliseconds(1),
            interval
        ));
    }

    #[tokio::test]
    async fn test_refresh_at_stamps_start_time() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_fetch_all().returning(|| Ok(vec![raw(1, "A")]));
        let mut repository = MockCatalogRepository::new();
        repository.expect_persist().returning(|_| Ok(()));

        let store = CatalogStore::new();
        let started_at = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        scheduler(provider, repository, &store).refresh_at(started_at).await;

        assert_eq!(store.snapshot().await.refreshed_at, Some(started_at));
    }

    /// Provider whose fetches take `delay` and are counted
    struct SlowProvider {
        delay: Duration,
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl CatalogProvider for SlowProvider {
        async fn fetch_all(&self) -> AppResult<Vec<RawProblem>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(vec![raw(1, "A")])
        }
    }

    fn slow_scheduler(delay: Duration, interval: Duration) -> (RefreshScheduler, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let provider = SlowProvider {
            delay,
            fetches: Arc::clone(&fetches),
        };
        let mut repository = MockCatalogRepository::new();
        repository.expect_persist().returning(|_| Ok(()));

        let scheduler = RefreshScheduler::new(
            Arc::new(provider),
            Arc::new(repository),
            CatalogStore::new(),
            interval,
        );
        (scheduler, fetches)
    }

    #[tokio::test]
    async fn test_slow_fetches_keep_the_refresh_cadence() {
        // ticks at 0, 1, 2, ... s; refreshes due at 0, 2, 4 and 6 s
        let (scheduler, fetches) =
            slow_scheduler(Duration::from_millis(100), Duration::from_secs(2));
        let handle = scheduler.start();

        tokio::time::sleep(Duration::from_millis(6500)).await;
        handle.stop().await;

        assert_eq!(fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_stop_interrupts_a_running_refresh() {
        let (scheduler, fetches) =
            slow_scheduler(Duration::from_secs(60), Duration::from_secs(2));
        let handle = scheduler.start();

        while fetches.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let stopped = tokio::time::timeout(Duration::from_secs(1), handle.stop()).await;
        assert!(stopped.is_ok());
    }

    #[test]
    fn test_poll_period_is_half_interval() {
        assert_eq!(poll_period(DEFAULT_REFRESH_INTERVAL), Duration::from_secs(3 * 60 * 60));
        assert_eq!(poll_period(Duration::from_millis(10)), Duration::from_secs(1));
    }
}
