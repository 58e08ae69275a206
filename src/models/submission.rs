use serde::{Deserialize, Serialize};

/// Verdict the judge assigns to an accepted submission
pub const ACCEPTED_VERDICT: &str = "OK";

/// A single submission from a user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub problem_id: String,
    pub problem_name: String,
    pub problem_rating: Option<i32>,
    pub problem_tags: Vec<String>,
    /// Missing while the submission is still being judged
    pub verdict: Option<String>,
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        self.verdict.as_deref() == Some(ACCEPTED_VERDICT)
    }
}

/// What the judge knows about a user: current rating plus submission history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserHistory {
    pub rating: Option<i32>,
    pub submissions: Vec<Submission>,
}

impl UserHistory {
    /// No rating and no submissions: nothing to build a recommendation from.
    ///
    /// A user rated 0 with submissions is not insufficient.
    pub fn is_insufficient(&self) -> bool {
        self.rating.is_none() && self.submissions.is_empty()
    }
}
