/// Codeforces API provider
///
/// Supplies both the user history (rating + submissions) and the full problemset.
///
/// API Flow:
/// 1. User history: /user.info → rating, pause, /user.status → submissions
/// 2. Problemset: /problemset.problems → raw problem records
///
/// Every response is wrapped in `{status, comment, result}`; anything other than
/// `status == "OK"` is treated as an upstream failure.
use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ApiEnvelope, ApiProblemset, ApiSubmission, ApiUser, RawProblem, Submission, UserHistory},
    services::{
        catalog::normalize_problem,
        providers::{CatalogProvider, UserHistoryProvider},
    },
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Pause between consecutive calls; the API allows roughly two requests per second
const REQUEST_PAUSE: Duration = Duration::from_millis(500);
const HISTORY_CACHE_TTL: u64 = 300; // 5 minutes

#[derive(Clone)]
pub struct CodeforcesClient {
    http_client: HttpClient,
    api_url: String,
    cache: Option<Cache>,
    history_ttl: u64,
    request_pause: Duration,
}

impl CodeforcesClient {
    /// Creates a client whose requests all time out after `timeout`
    pub fn new(api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache: None,
            history_ttl: HISTORY_CACHE_TTL,
            request_pause: REQUEST_PAUSE,
        })
    }

    /// Caches complete user histories for `ttl` seconds
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.history_ttl = ttl;
        self
    }

    pub fn with_request_pause(mut self, pause: Duration) -> Self {
        self.request_pause = pause;
        self
    }

    /// Calls one API method and unwraps its envelope
    async fn call<T: DeserializeOwned>(&self, method: &str, query: &[(&str, &str)]) -> AppResult<T> {
        let url = format!("{}/{}", self.api_url, method);

        tracing::debug!(method = %method, "Calling Codeforces API");

        let response = self.http_client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "API returned status {}: {}",
                status, body
            )));
        }

        let envelope: ApiEnvelope<T> = response.json().await?;

        if envelope.status != "OK" {
            return Err(AppError::ExternalApi(format!(
                "{} failed: {}",
                method,
                envelope.comment.unwrap_or_else(|| envelope.status.clone())
            )));
        }

        envelope
            .result
            .ok_or_else(|| AppError::ExternalApi(format!("{} returned no result", method)))
    }

    async fn fetch_rating(&self, handle: &str) -> AppResult<Option<i32>> {
        let users: Vec<ApiUser> = self.call("user.info", &[("handles", handle)]).await?;
        Ok(users.first().and_then(|user| user.rating))
    }

    async fn fetch_submissions(&self, handle: &str) -> AppResult<Vec<Submission>> {
        let submissions: Vec<ApiSubmission> = self.call("user.status", &[("handle", handle)]).await?;
        Ok(submissions.into_iter().filter_map(submission_from_api).collect())
    }

    async fn cached_history(&self, key: &CacheKey) -> Option<UserHistory> {
        let cache = self.cache.as_ref()?;
        match cache.get_from_cache(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, "User history cache read failed");
                None
            }
        }
    }
}

/// Submissions whose problem has no contest id or index cannot be referenced, so they are dropped
pub fn submission_from_api(api: ApiSubmission) -> Option<Submission> {
    let problem = normalize_problem(api.problem)?;
    Some(Submission {
        problem_id: problem.problem_id,
        problem_name: problem.problem_name,
        problem_rating: problem.problem_rating,
        problem_tags: problem.problem_tags,
        verdict: api.verdict,
    })
}

#[async_trait::async_trait]
impl UserHistoryProvider for CodeforcesClient {
    async fn fetch(&self, handle: &str) -> UserHistory {
        let key = CacheKey::UserHistory(handle.to_string());
        if let Some(history) = self.cached_history(&key).await {
            tracing::debug!(handle = %handle, "User history cache hit");
            return history;
        }

        let rating = match self.fetch_rating(handle).await {
            Ok(rating) => rating,
            Err(e) => {
                tracing::warn!(handle = %handle, error = %e, "Failed to fetch user info");
                return UserHistory::default();
            }
        };

        tokio::time::sleep(self.request_pause).await;

        let submissions = match self.fetch_submissions(handle).await {
            Ok(submissions) => submissions,
            Err(e) => {
                tracing::warn!(handle = %handle, error = %e, "Failed to fetch user submissions");
                return UserHistory {
                    rating,
                    submissions: Vec::new(),
                };
            }
        };

        let history = UserHistory {
            rating,
            submissions,
        };

        tracing::info!(
            handle = %handle,
            rating = ?history.rating,
            submissions = history.submissions.len(),
            "Fetched user history"
        );

        if let Some(cache) = &self.cache {
            cache.set_in_background(&key, &history, self.history_ttl);
        }

        history
    }
}

#[async_trait::async_trait]
impl CatalogProvider for CodeforcesClient {
    async fn fetch_all(&self) -> AppResult<Vec<RawProblem>> {
        let problemset: ApiProblemset = self.call("problemset.problems", &[]).await?;

        tracing::info!(
            records = problemset.problems.len(),
            "Fetched problemset from Codeforces"
        );

        Ok(problemset.problems)
    }
}
