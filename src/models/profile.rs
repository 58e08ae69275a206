use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Behavioral profile derived from a user's submission history
///
/// Built fresh for every recommendation request and never persisted.
/// `solved` and `unsolved_attempted` are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserProfile {
    pub solved: HashSet<String>,
    pub unsolved_attempted: HashSet<String>,
    pub solved_ratings: Vec<i32>,
    pub attempted_ratings: Vec<i32>,
    pub tag_success_rate: BTreeMap<String, f64>,
    pub preferred_tags: BTreeMap<String, u32>,
    pub struggled_tags: BTreeMap<String, u32>,
}

impl UserProfile {
    pub fn top_preferred(&self, limit: usize) -> Vec<(String, u32)> {
        most_common(&self.preferred_tags, limit)
    }

    pub fn top_struggled(&self, limit: usize) -> Vec<(String, u32)> {
        most_common(&self.struggled_tags, limit)
    }
}

/// Highest counts first, ties in tag order
fn most_common(counts: &BTreeMap<String, u32>, limit: usize) -> Vec<(String, u32)> {
    let mut entries: Vec<(String, u32)> = counts
        .iter()
        .map(|(tag, &count)| (tag.clone(), count))
        .collect();
    // Stable sort keeps the BTreeMap's tag order among equal counts
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_common_orders_by_count_then_tag() {
        let counts: BTreeMap<String, u32> = [("math", 1), ("dp", 1), ("graphs", 3)]
            .into_iter()
            .map(|(t, c)| (t.to_string(), c))
            .collect();

        let top = most_common(&counts, 2);
        assert_eq!(
            top,
            vec![("graphs".to_string(), 3), ("dp".to_string(), 1)]
        );
    }

    #[test]
    fn test_top_tags_on_empty_profile() {
        let profile = UserProfile::default();
        assert!(profile.top_preferred(5).is_empty());
        assert!(profile.top_struggled(5).is_empty());
    }
}
