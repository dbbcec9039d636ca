//! Tokenization, TF-IDF vectors and similarity clustering.
//!
//! Everything here is pure and in-memory:
//! - [`tokenize`]: text → index tokens (Russian + English stopwords removed)
//! - [`build_vectors`] / [`cosine_similarity`]: batch-scoped TF-IDF
//! - [`cluster`]: greedy single-link grouping with a size floor

pub mod cluster;
pub mod stopwords;
pub mod tfidf;
pub mod title;
pub mod tokenize;

pub use cluster::{ClusterDocument, ClusterOptions, ClusterOutcome, TitleStrategy, cluster};
pub use stopwords::is_stopword;
pub use tfidf::{
    Document, MAX_TERMS_PER_VECTOR, MIN_DOCUMENT_TOKENS, TermVector, build_vectors,
    cosine_similarity,
};
pub use title::smart_title;
pub use tokenize::tokenize;
