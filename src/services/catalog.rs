use serde_json::Value;

use crate::models::{Catalog, Problem, RawProblem};

/// Normalizes a raw problem listing into the canonical catalog
///
/// Records without a contest id or index are skipped, since they can never be
/// referenced or recommended. Bad ratings become unrated and bad tag lists become
/// empty. A malformed record never aborts the rest of the listing.
pub fn normalize_catalog(raw: Vec<RawProblem>) -> Catalog {
    let total = raw.len();
    let mut catalog = Catalog::new();
    let mut skipped = 0usize;
    let mut duplicates = 0usize;

    for record in raw {
        match normalize_problem(record) {
            Some(problem) => {
                if !catalog.insert(problem) {
                    duplicates += 1;
                }
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 || duplicates > 0 {
        tracing::warn!(
            total,
            skipped,
            duplicates,
            "Dropped problem records during normalization"
        );
    }

    tracing::debug!(problems = catalog.len(), "Catalog normalized");

    catalog
}

/// Converts one raw record into a `Problem`, or `None` if it has no usable id
pub fn normalize_problem(raw: RawProblem) -> Option<Problem> {
    let contest_id = coerce_id_part(&raw.contest_id)?;
    let index = coerce_id_part(&raw.index)?;

    Some(Problem {
        problem_id: Problem::make_id(&contest_id, &index),
        problem_name: match raw.name {
            Value::String(name) => name,
            _ => String::new(),
        },
        problem_rating: coerce_rating(&raw.rating),
        problem_tags: coerce_tags(&raw.tags),
    })
}

/// Contest ids arrive as numbers, indices as strings; accept either for both
fn coerce_id_part(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Integer rating, or `None` on anything that does not convert cleanly
pub fn coerce_rating(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .and_then(|f| i32::try_from(f.trunc() as i64).ok())
            }
        }
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// List of canonical tags, empty on malformed input
pub fn coerce_tags(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    let tags = items.iter().filter_map(|item| match item {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    });

    canonical_tags(tags)
}

/// Lower-cases and trims tags, dropping empties and repeats (first occurrence kept)
pub fn canonical_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
