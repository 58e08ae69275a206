//! TF-IDF vectors over tag documents, compared by cosine similarity.
//!
//! Terms are runs of two or more word characters from the lower-cased text.
//! IDF is smoothed as `ln((1 + n) / (1 + df)) + 1` and every vector is scaled
//! to unit length, so the cosine of two vectors is their dot product.

use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VectorizeError {
    #[error("empty vocabulary: documents contain no terms")]
    EmptyVocabulary,
}

/// Sparse unit-length vector keyed by vocabulary position
///
/// Ordered so that dot products over equal vectors sum in the same order and
/// produce bit-identical results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector(BTreeMap<usize, f64>);

impl SparseVector {
    pub fn dot(&self, other: &SparseVector) -> f64 {
        self.0
            .iter()
            .filter_map(|(idx, a)| other.0.get(idx).map(|b| a * b))
            .sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

/// Splits a document into terms
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Fits a vocabulary over `documents` and returns one vector per document
pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> Result<Vec<SparseVector>, VectorizeError> {
    let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

    let mut vocabulary: HashMap<&str, usize> = HashMap::new();
    let mut doc_freq: Vec<usize> = Vec::new();

    for tokens in &tokenized {
        let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for term in unique {
            let next = vocabulary.len();
            let idx = *vocabulary.entry(term).or_insert(next);
            if idx == doc_freq.len() {
                doc_freq.push(0);
            }
            doc_freq[idx] += 1;
        }
    }

    if vocabulary.is_empty() {
        return Err(VectorizeError::EmptyVocabulary);
    }

    let n = documents.len() as f64;
    let idf: Vec<f64> = doc_freq
        .iter()
        .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
        .collect();

    let vectors = tokenized
        .iter()
        .map(|tokens| {
            let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
            for token in tokens {
                let idx = vocabulary[token.as_str()];
                *weights.entry(idx).or_insert(0.0) += 1.0;
            }
            for (idx, weight) in weights.iter_mut() {
                *weight *= idf[*idx];
            }
            normalize(&mut weights);
            SparseVector(weights)
        })
        .collect();

    Ok(vectors)
}

/// Cosine similarity of two unit vectors; NaN is reported as 0
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let similarity = a.dot(b);
    if similarity.is_nan() {
        0.0
    } else {
        similarity
    }
}

fn normalize(weights: &mut BTreeMap<usize, f64>) {
    let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in weights.values_mut() {
            *weight /= norm;
        }
    }
}
