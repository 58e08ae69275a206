use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Base URL for problem statements on the judge
pub const PROBLEM_URL_BASE: &str = "https://codeforces.com/problemset/problem";

/// Placeholder URL for problems whose id is not in `<contest>-<index>` form
pub const PLACEHOLDER_URL: &str = "#";

/// A canonical, typed problem from the judge's problemset
///
/// `rating` is `None` for unrated problems. It is never defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub problem_id: String,
    pub problem_name: String,
    pub problem_rating: Option<i32>,
    pub problem_tags: Vec<String>,
}

impl Problem {
    /// Builds the canonical `<contest>-<index>` id
    pub fn make_id(contest_id: &str, index: &str) -> String {
        format!("{}-{}", contest_id, index)
    }

    /// Whitespace-joined tag document used for similarity scoring
    pub fn tag_document(&self) -> String {
        self.problem_tags.join(" ")
    }

    /// Problem statement URL, or `#` when the id cannot be split into contest and index
    pub fn url(&self) -> String {
        match self.problem_id.split_once('-') {
            Some((contest, index))
                if !contest.is_empty() && !index.is_empty() && !index.contains('-') =>
            {
                format!("{}/{}/{}", PROBLEM_URL_BASE, contest, index)
            }
            _ => PLACEHOLDER_URL.to_string(),
        }
    }
}

/// The full problem catalog, keyed by `problem_id`
///
/// Keeps the listing order of the judge so that ranking ties and samples are reproducible.
/// Duplicate ids are rejected on insert (first one wins).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    problems: Vec<Problem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a problem, returning `false` if its id was already present
    pub fn insert(&mut self, problem: Problem) -> bool {
        if self.index.contains_key(&problem.problem_id) {
            return false;
        }
        self.index
            .insert(problem.problem_id.clone(), self.problems.len());
        self.problems.push(problem);
        true
    }

    pub fn get(&self, problem_id: &str) -> Option<&Problem> {
        self.index.get(problem_id).map(|&i| &self.problems[i])
    }

    pub fn contains(&self, problem_id: &str) -> bool {
        self.index.contains_key(problem_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

impl FromIterator<Problem> for Catalog {
    fn from_iter<I: IntoIterator<Item = Problem>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for problem in iter {
            catalog.insert(problem);
        }
        catalog
    }
}
