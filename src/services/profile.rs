use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{Submission, UserProfile};

/// Minimum success rate for a tag to count as preferred
pub const PREFERRED_MIN_RATE: f64 = 0.75;
/// Maximum success rate for a tag to count as struggled
pub const STRUGGLED_MAX_RATE: f64 = 0.30;
/// Tags with fewer resolved attempts are never classified
pub const MIN_TAG_ATTEMPTS: u32 = 5;

/// Builds a behavioral profile from a raw submission history
///
/// Submissions are first resolved to one representative per problem (an
/// accepted submission wins, otherwise the first one seen). Tag statistics and
/// rating lists are computed over the resolved set only, so repeated attempts at
/// the same problem are counted once.
pub fn build_profile(submissions: &[Submission]) -> UserProfile {
    let resolved = resolve_by_problem(submissions);
    if resolved.is_empty() {
        return UserProfile::default();
    }

    let solved: HashSet<String> = resolved
        .iter()
        .filter(|s| s.is_accepted())
        .map(|s| s.problem_id.clone())
        .collect();

    let unsolved_attempted: HashSet<String> = resolved
        .iter()
        .filter(|s| !s.is_accepted())
        .map(|s| s.problem_id.clone())
        .filter(|id| !solved.contains(id))
        .collect();

    let solved_ratings: Vec<i32> = resolved
        .iter()
        .filter(|s| s.is_accepted())
        .filter_map(|s| s.problem_rating)
        .collect();

    let attempted_ratings: Vec<i32> = resolved.iter().filter_map(|s| s.problem_rating).collect();

    let (tag_success_rate, preferred_tags, struggled_tags) = classify_tags(&resolved);

    UserProfile {
        solved,
        unsolved_attempted,
        solved_ratings,
        attempted_ratings,
        tag_success_rate,
        preferred_tags,
        struggled_tags,
    }
}

/// One submission per problem id, in order of first appearance
fn resolve_by_problem(submissions: &[Submission]) -> Vec<&Submission> {
    let mut resolved: Vec<&Submission> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for submission in submissions {
        match position.get(submission.problem_id.as_str()) {
            None => {
                position.insert(submission.problem_id.as_str(), resolved.len());
                resolved.push(submission);
            }
            Some(&i) => {
                if submission.is_accepted() && !resolved[i].is_accepted() {
                    resolved[i] = submission;
                }
            }
        }
    }

    resolved
}

#[derive(Default)]
struct TagCounter {
    attempts: u32,
    solves: u32,
}

type TagClassification = (
    BTreeMap<String, f64>,
    BTreeMap<String, u32>,
    BTreeMap<String, u32>,
);

fn classify_tags(resolved: &[&Submission]) -> TagClassification {
    let mut counters: HashMap<&str, TagCounter> = HashMap::new();

    for submission in resolved {
        let accepted = submission.is_accepted();
        let unique: HashSet<&str> = submission.problem_tags.iter().map(String::as_str).collect();
        for tag in unique {
            let counter = counters.entry(tag).or_default();
            counter.attempts += 1;
            if accepted {
                counter.solves += 1;
            }
        }
    }

    let mut rates = BTreeMap::new();
    let mut preferred = BTreeMap::new();
    let mut struggled = BTreeMap::new();

    for (tag, counter) in counters {
        if counter.attempts == 0 {
            continue;
        }
        let rate = f64::from(counter.solves) / f64::from(counter.attempts);
        rates.insert(tag.to_string(), rate);

        if counter.attempts < MIN_TAG_ATTEMPTS {
            continue;
        }
        if rate >= PREFERRED_MIN_RATE {
            *preferred.entry(tag.to_string()).or_insert(0) += 1;
        } else if rate <= STRUGGLED_MAX_RATE {
            *struggled.entry(tag.to_string()).or_insert(0) += 1;
        }
    }

    (rates, preferred, struggled)
}
