//! Greedy single-link clustering over TF-IDF vectors.
//!
//! Deterministic for a given input order: seeds are visited in a fixed
//! order, candidate scans are sequential, and every term aggregation runs
//! over ordered vectors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use topicflow_shared::{ClusterData, ClusterMember, TopTerm};

use crate::tfidf::{MIN_DOCUMENT_TOKENS, TermVector, cosine_similarity, vectors_from_tokens};
use crate::title::smart_title;

/// A document handed to the engine.
#[derive(Debug, Clone, Copy)]
pub struct ClusterDocument<'a> {
    pub id: i64,
    pub title: &'a str,
    pub text: &'a str,
}

/// How cluster titles are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleStrategy {
    /// Top three aggregated terms.
    #[default]
    Terms,
    /// Entity/keyword heuristics over member titles and tokens.
    Smart,
}

impl std::str::FromStr for TitleStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terms" => Ok(Self::Terms),
            "smart" => Ok(Self::Smart),
            other => Err(format!("unknown title strategy \"{other}\"")),
        }
    }
}

/// Engine parameters.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Minimum cosine similarity to the seed for membership.
    pub threshold: f64,
    /// Groups smaller than this are discarded.
    pub min_cluster_size: usize,
    /// Length of each cluster's top-term list.
    pub max_terms: usize,
    pub title_strategy: TitleStrategy,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            threshold: 0.35,
            min_cluster_size: 2,
            max_terms: 10,
            title_strategy: TitleStrategy::Terms,
        }
    }
}

/// Clusters plus the accounting for documents left outside them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterOutcome {
    /// In seed order.
    pub clusters: Vec<ClusterData>,
    /// Passed the token floor but joined no cluster; input order.
    pub singles: Vec<i64>,
    /// Fewer than [`MIN_DOCUMENT_TOKENS`] tokens; input order.
    pub below_token_floor: Vec<i64>,
}

/// Group similar documents.
///
/// Documents are visited richest first (title + text length, descending,
/// input order on ties). Each unclaimed document seeds a scan over the later
/// unclaimed documents; members at or above `threshold` join the group, and
/// the group becomes a cluster when it reaches `min_cluster_size`.
#[instrument(skip_all, fields(docs = docs.len(), threshold = opts.threshold))]
pub fn cluster(docs: &[ClusterDocument<'_>], opts: &ClusterOptions) -> ClusterOutcome {
    let mut below_token_floor = Vec::new();
    let mut eligible: Vec<(usize, Vec<String>)> = Vec::new();

    for (idx, doc) in docs.iter().enumerate() {
        let tokens = crate::tfidf::Document {
            title: doc.title,
            text: doc.text,
        }
        .tokens();
        if tokens.len() >= MIN_DOCUMENT_TOKENS {
            eligible.push((idx, tokens));
        } else {
            below_token_floor.push(doc.id);
        }
    }

    if eligible.is_empty() {
        debug!("no documents above the token floor");
        return ClusterOutcome {
            below_token_floor,
            ..ClusterOutcome::default()
        };
    }

    eligible.sort_by_key(|(idx, _)| {
        let doc = &docs[*idx];
        std::cmp::Reverse(doc.title.chars().count() + doc.text.chars().count())
    });

    let (order, token_lists): (Vec<usize>, Vec<Vec<String>>) = eligible.into_iter().unzip();
    let vectors = vectors_from_tokens(&token_lists);

    let mut claimed = vec![false; order.len()];
    let mut clusters = Vec::new();

    for seed in 0..order.len() {
        if claimed[seed] {
            continue;
        }

        let mut group: Vec<(usize, f64)> = vec![(seed, 1.0)];
        for candidate in (seed + 1)..order.len() {
            if claimed[candidate] {
                continue;
            }
            let sim = cosine_similarity(&vectors[seed], &vectors[candidate]);
            if sim >= opts.threshold {
                group.push((candidate, sim));
            }
        }

        if group.len() < opts.min_cluster_size {
            continue;
        }

        let members: Vec<usize> = group.iter().map(|(pos, _)| *pos).collect();
        let top_terms = aggregate_terms(&vectors, &members, opts.max_terms);

        let title = match opts.title_strategy {
            TitleStrategy::Terms => terms_title(&top_terms),
            TitleStrategy::Smart => {
                let member_docs: Vec<&ClusterDocument<'_>> =
                    members.iter().map(|pos| &docs[order[*pos]]).collect();
                smart_title(&member_docs)
            }
        };

        // Unreachable with a size floor of 2, kept for parity with the seed rule.
        let avg_similarity = if group.len() > 1 {
            group[1..].iter().map(|(_, sim)| sim).sum::<f64>() / (group.len() - 1) as f64
        } else {
            1.0
        };

        let documents = group
            .iter()
            .map(|(pos, sim)| ClusterMember {
                id: docs[order[*pos]].id,
                similarity: *sim,
            })
            .collect();

        for pos in &members {
            claimed[*pos] = true;
        }

        debug!(%title, size = group.len(), avg_similarity, "cluster formed");
        clusters.push(ClusterData {
            title,
            mentions_count: group.len(),
            top_terms,
            avg_similarity,
            documents,
        });
    }

    let mut single_indices: Vec<usize> = order
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(idx, _)| *idx)
        .collect();
    single_indices.sort_unstable();

    ClusterOutcome {
        clusters,
        singles: single_indices.into_iter().map(|idx| docs[idx].id).collect(),
        below_token_floor,
    }
}

/// Sum member weights per term; highest first, first-seen order on ties.
fn aggregate_terms(vectors: &[TermVector], members: &[usize], max_terms: usize) -> Vec<TopTerm> {
    let mut totals: Vec<(&str, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for pos in members {
        for (term, weight) in vectors[*pos].ranked() {
            match index.get(term.as_str()) {
                Some(&slot) => totals[slot].1 += weight,
                None => {
                    index.insert(term.as_str(), totals.len());
                    totals.push((term.as_str(), *weight));
                }
            }
        }
    }

    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
        .into_iter()
        .take(max_terms)
        .map(|(term, weight)| TopTerm {
            term: term.to_string(),
            weight,
        })
        .collect()
}

fn terms_title(top_terms: &[TopTerm]) -> String {
    if top_terms.is_empty() {
        return "cluster".to_string();
    }
    top_terms
        .iter()
        .take(3)
        .map(|t| t.term.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
