use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::RecommendationReport,
    services::recommendations::{recommend_for_user, RecommendationRequest},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    /// Parsed by the request validator so bad values get a JSON error
    pub num_recommendations: Option<String>,
    /// Comma-separated tags to steer the ranking towards
    pub goal_tags: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogStatusResponse {
    pub problem_count: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// Service banner
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Codeforces problem recommender is running" }))
}

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Size and age of the currently published catalog
pub async fn catalog_status(State(state): State<AppState>) -> Json<CatalogStatusResponse> {
    let snapshot = state.catalog.snapshot().await;
    Json(CatalogStatusResponse {
        problem_count: snapshot.catalog.len(),
        last_refreshed_at: snapshot.refreshed_at,
    })
}

/// Personalized problem recommendations for a handle
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(handle): Path<String>,
    Query(query): Query<RecommendQuery>,
) -> AppResult<Json<RecommendationReport>> {
    let request = RecommendationRequest::new(
        &handle,
        query.num_recommendations.as_deref(),
        query.goal_tags.as_deref(),
    )?;

    tracing::debug!(
        request_id = %request_id,
        handle = %request.handle,
        num_recommendations = request.num_recommendations,
        goal_tags = ?request.goal_tags,
        "Recommendation request"
    );

    let report = recommend_for_user(&state.catalog, state.history.as_ref(), &request).await?;
    Ok(Json(report))
}
