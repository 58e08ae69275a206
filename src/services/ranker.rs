use rand::Rng;
use std::cmp::Ordering;

use crate::{
    models::{Problem, UserProfile},
    services::{
        candidates::sample_problems,
        tfidf::{cosine_similarity, fit_transform},
    },
};

/// Times each goal tag is repeated in the interest document
pub const GOAL_TAG_REPEAT: usize = 5;
/// Extra repetitions for struggled tags, biasing towards remediation
pub const STRUGGLED_TAG_BOOST: u32 = 5;
/// Extra repetitions for preferred tags
pub const PREFERRED_TAG_BOOST: u32 = 1;
/// Vocabulary used when the user has no signal at all
pub const GENERIC_TAGS: [&str; 6] = [
    "dp",
    "greedy",
    "implementation",
    "math",
    "data structures",
    "algorithms",
];
pub const GENERIC_TAG_REPEAT: usize = 2;

/// Where the interest document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterestSource {
    GoalTags,
    StruggledTags,
    PreferredTags,
    Generic,
}

/// Synthesized text describing what the user should practice next
#[derive(Debug, Clone, PartialEq)]
pub struct InterestDocument {
    pub source: InterestSource,
    pub text: String,
}

impl InterestDocument {
    /// First non-empty source wins: goal tags, struggled tags, preferred tags, generic
    pub fn for_user(profile: &UserProfile, goal_tags: &[String]) -> Self {
        let mut words: Vec<&str> = Vec::new();

        let source = if !goal_tags.is_empty() {
            for _ in 0..GOAL_TAG_REPEAT {
                words.extend(goal_tags.iter().map(String::as_str));
            }
            InterestSource::GoalTags
        } else if !profile.struggled_tags.is_empty() {
            for (tag, &count) in &profile.struggled_tags {
                let times = (count + STRUGGLED_TAG_BOOST) as usize;
                words.extend(std::iter::repeat(tag.as_str()).take(times));
            }
            InterestSource::StruggledTags
        } else if !profile.preferred_tags.is_empty() {
            for (tag, &count) in &profile.preferred_tags {
                let times = (count + PREFERRED_TAG_BOOST) as usize;
                words.extend(std::iter::repeat(tag.as_str()).take(times));
            }
            InterestSource::PreferredTags
        } else {
            for _ in 0..GENERIC_TAG_REPEAT {
                words.extend(GENERIC_TAGS);
            }
            InterestSource::Generic
        };

        Self {
            source,
            text: words.join(" "),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A candidate with its similarity score, if one was computed
#[derive(Debug, Clone, PartialEq)]
pub struct RankedProblem<'a> {
    pub problem: &'a Problem,
    pub similarity: Option<f64>,
}

/// Ranking strategies tried in order until one produces a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingStrategy {
    /// TF-IDF cosine similarity against the interest document
    Similarity,
    /// Uniform sample, used when similarity cannot be computed
    RandomSample,
}

pub const RANKING_STRATEGIES: [RankingStrategy; 2] =
    [RankingStrategy::Similarity, RankingStrategy::RandomSample];

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<'a> {
    pub strategy: RankingStrategy,
    pub items: Vec<RankedProblem<'a>>,
}

/// Ranks candidates for the user and keeps the best `count`
///
/// Problems the user attempted without solving are never returned, whichever
/// strategy produced the list.
pub fn rank_candidates<'a, R: Rng + ?Sized>(
    candidates: &[&'a Problem],
    profile: &UserProfile,
    goal_tags: &[String],
    count: usize,
    rng: &mut R,
) -> Ranking<'a> {
    let document = InterestDocument::for_user(profile, goal_tags);
    tracing::debug!(source = ?document.source, "Interest document built");

    for strategy in RANKING_STRATEGIES {
        let items = match strategy {
            RankingStrategy::Similarity => rank_by_similarity(candidates, profile, &document, count),
            RankingStrategy::RandomSample => Some(rank_by_sample(candidates, profile, count, rng)),
        };
        if let Some(items) = items {
            return Ranking { strategy, items };
        }
        tracing::warn!(?strategy, "Ranking strategy produced no result, falling back");
    }

    Ranking {
        strategy: RankingStrategy::RandomSample,
        items: Vec::new(),
    }
}

/// Sorts candidates by similarity (descending) then rating (ascending)
///
/// Returns `None` when the interest document is empty or the vocabulary degenerates.
pub fn rank_by_similarity<'a>(
    candidates: &[&'a Problem],
    profile: &UserProfile,
    document: &InterestDocument,
    count: usize,
) -> Option<Vec<RankedProblem<'a>>> {
    if document.is_empty() {
        return None;
    }

    let mut texts: Vec<String> = candidates.iter().map(|p| p.tag_document()).collect();
    texts.push(document.text.clone());

    let mut vectors = match fit_transform(&texts) {
        Ok(vectors) => vectors,
        Err(e) => {
            tracing::warn!(error = %e, candidates = candidates.len(), "Vectorization failed");
            return None;
        }
    };
    let user_vector = vectors.pop()?;

    let mut ranked: Vec<RankedProblem<'a>> = candidates
        .iter()
        .zip(vectors.iter())
        .map(|(&problem, vector)| RankedProblem {
            problem,
            similarity: Some(cosine_similarity(&user_vector, vector)),
        })
        .collect();

    // sort_by is stable: equal keys keep candidate order
    ranked.sort_by(compare_ranked);

    Some(
        ranked
            .into_iter()
            .filter(|r| !profile.unsolved_attempted.contains(&r.problem.problem_id))
            .take(count)
            .collect(),
    )
}

/// Random sample of candidates the user has not attempted, without scores
pub fn rank_by_sample<'a, R: Rng + ?Sized>(
    candidates: &[&'a Problem],
    profile: &UserProfile,
    count: usize,
    rng: &mut R,
) -> Vec<RankedProblem<'a>> {
    let fresh: Vec<&'a Problem> = candidates
        .iter()
        .copied()
        .filter(|p| !profile.unsolved_attempted.contains(&p.problem_id))
        .collect();

    sample_problems(&fresh, count, rng)
        .into_iter()
        .map(|problem| RankedProblem {
            problem,
            similarity: None,
        })
        .collect()
}

fn compare_ranked(a: &RankedProblem<'_>, b: &RankedProblem<'_>) -> Ordering {
    let sa = a.similarity.unwrap_or(0.0);
    let sb = b.similarity.unwrap_or(0.0);
    sb.total_cmp(&sa)
        .then_with(|| compare_ratings(a.problem.problem_rating, b.problem.problem_rating))
}

/// Ascending, with unrated problems last
fn compare_ratings(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
