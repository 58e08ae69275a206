use serde::Serialize;
use std::collections::BTreeMap;

use super::Problem;

/// A single recommended problem returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub problem_id: String,
    pub problem_name: String,
    /// Serialized as `null` for unrated problems
    pub problem_rating: Option<i32>,
    pub problem_tags: Vec<String>,
    /// Absent when the list came from a random-sample fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub url: String,
}

impl Recommendation {
    pub fn new(problem: &Problem, similarity: Option<f64>) -> Self {
        Self {
            problem_id: problem.problem_id.clone(),
            problem_name: problem.problem_name.clone(),
            problem_rating: problem.problem_rating,
            problem_tags: problem.problem_tags.clone(),
            similarity,
            url: problem.url(),
        }
    }
}

/// Full response for a recommendation request
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    pub handle: String,
    pub user_rating: Option<i32>,
    pub solved_count: usize,
    pub unsolved_attempts_count: usize,
    pub tag_success_rates: BTreeMap<String, f64>,
    pub preferred_tags: Vec<(String, u32)>,
    pub struggled_tags: Vec<(String, u32)>,
    pub recommendations: Vec<Recommendation>,
}
