use serde::Deserialize;
use serde_json::Value;

pub mod problem;
pub mod profile;
pub mod recommendation;
pub mod submission;

pub use problem::{Catalog, Problem};
pub use profile::UserProfile;
pub use recommendation::{Recommendation, RecommendationReport};
pub use submission::{Submission, UserHistory, ACCEPTED_VERDICT};

// ============================================================================
// Codeforces API Types
// ============================================================================

/// Envelope wrapping every Codeforces API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub result: Option<T>,
}

/// Entry of `user.info`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    #[serde(default)]
    pub rating: Option<i32>,
}

/// Entry of `user.status`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSubmission {
    #[serde(default)]
    pub problem: RawProblem,
    #[serde(default)]
    pub verdict: Option<String>,
}

/// Result of `problemset.problems`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProblemset {
    #[serde(default)]
    pub problems: Vec<RawProblem>,
}

/// Loosely-typed problem record as the judge sends it
///
/// Every field is kept as raw JSON so one malformed record never fails the
/// deserialization of the whole listing. Coercion happens in the catalog normalizer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProblem {
    #[serde(default)]
    pub contest_id: Value,
    #[serde(default)]
    pub index: Value,
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub rating: Value,
    #[serde(default)]
    pub tags: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_ok_with_result() {
        let raw = json!({
            "status": "OK",
            "result": [{"handle": "tourist", "rating": 3800}]
        });
        let envelope: ApiEnvelope<Vec<ApiUser>> = serde_json::from_value(raw).unwrap();
        assert_eq!(envelope.status, "OK");
        assert_eq!(envelope.result.unwrap()[0].rating, Some(3800));
    }

    #[test]
    fn test_envelope_failed_without_result() {
        let raw = json!({
            "status": "FAILED",
            "comment": "handles: User with handle nobody_xyz not found"
        });
        let envelope: ApiEnvelope<Vec<ApiUser>> = serde_json::from_value(raw).unwrap();
        assert_eq!(envelope.status, "FAILED");
        assert!(envelope.result.is_none());
        assert!(envelope.comment.unwrap().contains("not found"));
    }

    #[test]
    fn test_unrated_user_has_no_rating() {
        let user: ApiUser = serde_json::from_value(json!({"handle": "newbie"})).unwrap();
        assert_eq!(user.rating, None);
    }

    #[test]
    fn test_raw_problem_tolerates_odd_fields() {
        let raw: RawProblem = serde_json::from_value(json!({
            "contestId": 1,
            "index": "A",
            "name": "Theatre Square",
            "rating": "1000",
            "tags": "math"
        }))
        .unwrap();
        assert_eq!(raw.contest_id, json!(1));
        assert_eq!(raw.rating, json!("1000"));
        assert_eq!(raw.tags, json!("math"));
    }

    #[test]
    fn test_submission_without_verdict() {
        let sub: ApiSubmission = serde_json::from_value(json!({
            "id": 1,
            "problem": {"contestId": 1, "index": "A", "name": "X", "tags": []}
        }))
        .unwrap();
        assert_eq!(sub.verdict, None);
        assert_eq!(sub.problem.index, json!("A"));
    }
}
