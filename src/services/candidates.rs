use rand::seq::IndexedRandom;
use rand::Rng;

use crate::models::{Catalog, Problem, UserProfile};

/// Lowest rating the judge assigns
pub const MIN_PROBLEM_RATING: i32 = 800;
/// Window for users without a rating
pub const BEGINNER_WINDOW: DifficultyWindow = DifficultyWindow {
    min: MIN_PROBLEM_RATING,
    max: 1200,
};
/// How far below the user's rating the primary window reaches
pub const BELOW_RATING: i32 = 250;
/// How far above the user's rating the primary window reaches
pub const ABOVE_RATING: i32 = 200;
/// Half-width of the widened window
pub const WIDENED_MARGIN: i32 = 500;

/// Inclusive rating range of problems worth recommending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyWindow {
    pub min: i32,
    pub max: i32,
}

impl DifficultyWindow {
    /// Unrated problems are admitted by every window
    pub fn admits(&self, rating: Option<i32>) -> bool {
        match rating {
            Some(r) => self.min <= r && r <= self.max,
            None => true,
        }
    }
}

/// Difficulty windows tried in order until one yields candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStrategy {
    /// Slightly easier to somewhat harder than the user's rating
    Primary,
    /// A wide band used when the primary window is empty
    Widened,
}

pub const WINDOW_STRATEGIES: [WindowStrategy; 2] = [WindowStrategy::Primary, WindowStrategy::Widened];

impl WindowStrategy {
    pub fn window(self, user_rating: Option<i32>) -> DifficultyWindow {
        match (self, user_rating) {
            (WindowStrategy::Primary, None) => BEGINNER_WINDOW,
            (WindowStrategy::Primary, Some(rating)) => DifficultyWindow {
                min: MIN_PROBLEM_RATING.max(rating.saturating_sub(BELOW_RATING)),
                max: rating.saturating_add(ABOVE_RATING),
            },
            (WindowStrategy::Widened, rating) => DifficultyWindow {
                min: MIN_PROBLEM_RATING
                    .max(rating.unwrap_or(BEGINNER_WINDOW.min).saturating_sub(WIDENED_MARGIN)),
                max: rating
                    .unwrap_or(BEGINNER_WINDOW.max)
                    .saturating_add(WIDENED_MARGIN),
            },
        }
    }
}

/// Outcome of candidate selection
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateSelection<'a> {
    /// Problems inside a difficulty window, to be ranked by similarity
    Windowed {
        strategy: WindowStrategy,
        window: DifficultyWindow,
        candidates: Vec<&'a Problem>,
    },
    /// Every window came up empty; this random sample is the final answer
    Sampled(Vec<&'a Problem>),
}

/// Problems the user has not solved yet, in catalog order
pub fn unsolved_problems<'a>(catalog: &'a Catalog, profile: &UserProfile) -> Vec<&'a Problem> {
    catalog
        .iter()
        .filter(|p| !profile.solved.contains(&p.problem_id))
        .collect()
}

/// Problems admitted by `window`, in input order
pub fn within_window<'a>(problems: &[&'a Problem], window: DifficultyWindow) -> Vec<&'a Problem> {
    problems
        .iter()
        .copied()
        .filter(|p| window.admits(p.problem_rating))
        .collect()
}

/// Uniform sample of `min(count, problems.len())` problems
pub fn sample_problems<'a, R: Rng + ?Sized>(
    problems: &[&'a Problem],
    count: usize,
    rng: &mut R,
) -> Vec<&'a Problem> {
    problems.choose_multiple(rng, count).copied().collect()
}

/// Narrows the catalog to the problems worth ranking for this user
///
/// Solved problems are always removed. The window strategies run in order and
/// the first non-empty window wins. If none yields anything, a random sample of
/// the unsolved problems is returned instead and ranking is skipped.
pub fn select_candidates<'a, R: Rng + ?Sized>(
    catalog: &'a Catalog,
    user_rating: Option<i32>,
    profile: &UserProfile,
    count: usize,
    rng: &mut R,
) -> CandidateSelection<'a> {
    let available = unsolved_problems(catalog, profile);

    for strategy in WINDOW_STRATEGIES {
        let window = strategy.window(user_rating);
        let candidates = within_window(&available, window);
        if !candidates.is_empty() {
            tracing::debug!(
                ?strategy,
                min = window.min,
                max = window.max,
                candidates = candidates.len(),
                "Difficulty window selected"
            );
            return CandidateSelection::Windowed {
                strategy,
                window,
                candidates,
            };
        }
        tracing::debug!(?strategy, "Difficulty window empty");
    }

    tracing::info!(
        available = available.len(),
        "No problems in any difficulty window, sampling unsolved problems"
    );
    CandidateSelection::Sampled(sample_problems(&available, count, rng))
}
