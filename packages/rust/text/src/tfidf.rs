//! Batch-scoped TF-IDF vectors and cosine similarity.
//!
//! The corpus is always the batch being processed; there is no global index.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::tokenize::tokenize;

/// Documents with fewer tokens are left out of vector building and clustering.
pub const MIN_DOCUMENT_TOKENS: usize = 5;

/// Terms kept per document vector, highest weight first.
pub const MAX_TERMS_PER_VECTOR: usize = 200;

/// A title/text pair treated as one pseudo-document.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub title: &'a str,
    pub text: &'a str,
}

impl Document<'_> {
    /// Tokens of `title + " " + text`.
    pub fn tokens(&self) -> Vec<String> {
        tokenize(&format!("{} {}", self.title, self.text))
    }
}

/// Sparse term → weight vector.
///
/// Keeps two views: `ranked` (weight descending, ties in first-encounter
/// order) for top-N selection, and a sorted map so that similarity sums run
/// in a fixed term order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    ranked: Vec<(String, f64)>,
    weights: BTreeMap<String, f64>,
}

impl TermVector {
    /// Build from `(term, weight)` pairs already in rank order.
    pub fn from_ranked(ranked: Vec<(String, f64)>) -> Self {
        let weights = ranked.iter().cloned().collect();
        Self { ranked, weights }
    }

    pub fn ranked(&self) -> &[(String, f64)] {
        &self.ranked
    }

    pub fn get(&self, term: &str) -> Option<f64> {
        self.weights.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    fn norm_squared(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum()
    }
}

/// Build TF-IDF vectors for every document with at least
/// [`MIN_DOCUMENT_TOKENS`] tokens, keyed by the document's input index.
///
/// Short documents are absent from the result and do not count towards
/// document frequencies.
pub fn build_vectors(docs: &[Document<'_>]) -> BTreeMap<usize, TermVector> {
    let kept: Vec<(usize, Vec<String>)> = docs
        .iter()
        .enumerate()
        .map(|(idx, doc)| (idx, doc.tokens()))
        .filter(|(_, tokens)| tokens.len() >= MIN_DOCUMENT_TOKENS)
        .collect();

    let token_lists: Vec<Vec<String>> = kept.iter().map(|(_, t)| t.clone()).collect();
    let vectors = vectors_from_tokens(&token_lists);

    kept.into_iter()
        .map(|(idx, _)| idx)
        .zip(vectors)
        .collect()
}

/// TF-IDF over pre-tokenized documents; one vector per input, same order.
///
/// `tf` is the raw count, `idf = 1 + ln(N / (1 + df))`, which stays positive
/// for any batch.
pub(crate) fn vectors_from_tokens(docs: &[Vec<String>]) -> Vec<TermVector> {
    let counts: Vec<Vec<(&str, usize)>> = docs.iter().map(|d| count_terms(d)).collect();

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for doc in &counts {
        for (term, _) in doc {
            *doc_freq.entry(*term).or_insert(0) += 1;
        }
    }

    let n = docs.len() as f64;
    counts
        .iter()
        .map(|doc| {
            let mut ranked: Vec<(String, f64)> = doc
                .iter()
                .map(|(term, tf)| {
                    let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                    let idf = 1.0 + (n / (1.0 + df)).ln();
                    (term.to_string(), *tf as f64 * idf)
                })
                .collect();
            // Stable: equal weights keep first-encounter order.
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            ranked.truncate(MAX_TERMS_PER_VECTOR);
            TermVector::from_ranked(ranked)
        })
        .collect()
}

/// Term counts in first-encounter order.
fn count_terms(tokens: &[String]) -> Vec<(&str, usize)> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        match index.get(token.as_str()) {
            Some(&pos) => order[pos].1 += 1,
            None => {
                index.insert(token.as_str(), order.len());
                order.push((token.as_str(), 1));
            }
        }
    }
    order
}

/// Cosine similarity of two non-negative vectors, in `[0, 1]`.
///
/// Returns 0 when either vector has zero norm.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let norm_a = a.norm_squared();
    let norm_b = b.norm_squared();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut left = a.weights.iter().peekable();
    let mut right = b.weights.iter().peekable();
    loop {
        let (Some((ka, va)), Some((kb, vb))) = (left.peek().copied(), right.peek().copied())
        else {
            break;
        };
        match ka.cmp(kb) {
            Ordering::Less => {
                left.next();
            }
            Ordering::Greater => {
                right.next();
            }
            Ordering::Equal => {
                dot += va * vb;
                left.next();
                right.next();
            }
        }
    }

    (dot / (norm_a * norm_b).sqrt()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc<'a>(title: &'a str, text: &'a str) -> Document<'a> {
        Document { title, text }
    }

    #[test]
    fn short_documents_are_excluded() {
        let docs = [
            doc("Rust compiler release", "brings faster builds and better diagnostics"),
            doc("Tiny", "note"),
        ];
        let vectors = build_vectors(&docs);
        assert_eq!(vectors.len(), 1);
        assert!(vectors.contains_key(&0));
        assert!(!vectors.contains_key(&1));
    }

    #[test]
    fn rare_terms_outweigh_common_terms() {
        let docs = [
            doc("market report", "stocks rally stocks rally market report today"),
            doc("market report", "bonds slide quietly market report today"),
            doc("market report", "gold climbs steadily market report today"),
        ];
        let vectors = build_vectors(&docs);
        let first = &vectors[&0];
        // "stocks" appears twice and only here; "market" appears everywhere.
        assert!(first.get("stocks").unwrap() > first.get("market").unwrap());
        assert_eq!(first.ranked()[0].0, "stocks");
    }

    #[test]
    fn equal_weights_keep_first_encounter_order() {
        let docs = [doc("alpha bravo charlie", "delta echo")];
        let vectors = build_vectors(&docs);
        let terms: Vec<&str> = vectors[&0].ranked().iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(terms, vec!["alpha", "bravo", "charlie", "delta", "echo"]);
    }

    #[test]
    fn vectors_are_capped() {
        let text: Vec<String> = (0..300).map(|i| format!("term{i:03}")).collect();
        let text = text.join(" ");
        let docs = [doc("", &text)];
        let vectors = build_vectors(&docs);
        assert_eq!(vectors[&0].len(), MAX_TERMS_PER_VECTOR);
        assert_eq!(vectors[&0].ranked()[0].0, "term000");
    }

    #[test]
    fn self_similarity_is_one() {
        let v = TermVector::from_ranked(vec![
            ("alpha".into(), 2.5),
            ("bravo".into(), 0.3),
            ("charlie".into(), 1.7),
        ]);
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-12, "sim = {sim}");
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = TermVector::from_ranked(vec![
            ("alpha".into(), 1.3),
            ("bravo".into(), 0.7),
            ("delta".into(), 2.1),
        ]);
        let b = TermVector::from_ranked(vec![
            ("bravo".into(), 1.9),
            ("charlie".into(), 0.4),
            ("delta".into(), 0.2),
        ]);
        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);
        assert_eq!(ab, ba);
        assert!(ab > 0.0 && ab < 1.0);
    }

    #[test]
    fn disjoint_and_empty_vectors() {
        let a = TermVector::from_ranked(vec![("alpha".into(), 1.0)]);
        let b = TermVector::from_ranked(vec![("bravo".into(), 1.0)]);
        let empty = TermVector::default();
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a, &empty), 0.0);
        assert_eq!(cosine_similarity(&empty, &empty), 0.0);
    }
}
