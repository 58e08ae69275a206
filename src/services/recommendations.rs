use rand::Rng;

use crate::{
    error::{AppError, AppResult},
    models::{Catalog, Recommendation, RecommendationReport, UserProfile},
    services::{
        candidates::{select_candidates, CandidateSelection},
        catalog_store::CatalogReader,
        profile::build_profile,
        providers::UserHistoryProvider,
        ranker::rank_candidates,
    },
};

/// Default number of recommendations per request
pub const DEFAULT_RECOMMENDATIONS: usize = 10;
/// Length of the preferred/struggled tag lists in the report
pub const TOP_TAGS: usize = 5;

/// A validated recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub handle: String,
    pub num_recommendations: usize,
    pub goal_tags: Vec<String>,
}

impl RecommendationRequest {
    pub fn new(
        handle: &str,
        num_recommendations: Option<&str>,
        goal_tags: Option<&str>,
    ) -> AppResult<Self> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(AppError::InvalidInput("Handle cannot be empty".to_string()));
        }

        let num_recommendations = match num_recommendations.map(str::trim) {
            None | Some("") => DEFAULT_RECOMMENDATIONS,
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                AppError::InvalidInput(format!(
                    "num_recommendations must be a non-negative integer, got '{}'",
                    raw
                ))
            })?,
        };

        Ok(Self {
            handle: handle.to_string(),
            num_recommendations,
            goal_tags: goal_tags.map(parse_goal_tags).unwrap_or_default(),
        })
    }
}

/// Splits a comma-separated tag list into canonical tags
pub fn parse_goal_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Runs candidate selection and ranking for an already-built profile
///
/// An empty catalog produces an empty list; callers that need to report an
/// unavailable catalog check for that before calling.
pub fn recommend_problems<R: Rng + ?Sized>(
    user_rating: Option<i32>,
    profile: &UserProfile,
    catalog: &Catalog,
    count: usize,
    goal_tags: &[String],
    rng: &mut R,
) -> Vec<Recommendation> {
    if catalog.is_empty() {
        return Vec::new();
    }

    match select_candidates(catalog, user_rating, profile, count, rng) {
        CandidateSelection::Sampled(sample) => sample
            .into_iter()
            .map(|problem| Recommendation::new(problem, None))
            .collect(),
        CandidateSelection::Windowed { candidates, .. } => {
            let ranking = rank_candidates(&candidates, profile, goal_tags, count, rng);
            tracing::debug!(strategy = ?ranking.strategy, "Candidates ranked");
            ranking
                .items
                .iter()
                .map(|ranked| Recommendation::new(ranked.problem, ranked.similarity))
                .collect()
        }
    }
}

/// Serves one recommendation request end to end
///
/// Fails with `ServiceUnavailable` while no catalog has been published and with
/// `NotFound` when the judge has neither a rating nor submissions for the handle.
pub async fn recommend_for_user(
    catalog: &CatalogReader,
    history_provider: &dyn UserHistoryProvider,
    request: &RecommendationRequest,
) -> AppResult<RecommendationReport> {
    let snapshot = catalog.snapshot().await;
    if snapshot.catalog.is_empty() {
        tracing::error!("Recommendation requested before the problem catalog is available");
        return Err(AppError::ServiceUnavailable(
            "Problem database not initialized. Please try again in a moment.".to_string(),
        ));
    }

    let history = history_provider.fetch(&request.handle).await;
    if history.is_insufficient() {
        tracing::warn!(handle = %request.handle, "No rating or submissions found");
        return Err(AppError::NotFound(format!(
            "Could not retrieve sufficient data for handle: {}. Please check the handle or ensure they have public submissions.",
            request.handle
        )));
    }

    let profile = build_profile(&history.submissions);

    let recommendations = {
        let mut rng = rand::rng();
        recommend_problems(
            history.rating,
            &profile,
            &snapshot.catalog,
            request.num_recommendations,
            &request.goal_tags,
            &mut rng,
        )
    };

    tracing::info!(
        handle = %request.handle,
        solved = profile.solved.len(),
        unsolved_attempts = profile.unsolved_attempted.len(),
        recommendations = recommendations.len(),
        "Generated recommendations"
    );

    Ok(RecommendationReport {
        handle: request.handle.clone(),
        user_rating: history.rating,
        solved_count: profile.solved.len(),
        unsolved_attempts_count: profile.unsolved_attempted.len(),
        preferred_tags: profile.top_preferred(TOP_TAGS),
        struggled_tags: profile.top_struggled(TOP_TAGS),
        tag_success_rates: profile.tag_success_rate,
        recommendations,
    })
}
