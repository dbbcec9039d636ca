//! Built-in processors.
//!
//! Registration order is fixed: extraction, dedup, filters, transforms,
//! clustering. That is also the conventional pipeline shape, though only the
//! declared constraints are enforced.

pub mod cluster_tfidf;
pub mod dedup_url;
pub mod exclude_phrases;
pub mod extract_html;
pub mod extract_text;
pub mod filter_author;
pub mod trim_text;

use std::sync::Arc;

use crate::processor::Processor;

pub use cluster_tfidf::ClusterTfidf;
pub use dedup_url::DedupUrl;
pub use exclude_phrases::ExcludePhrases;
pub use extract_html::ExtractHtml;
pub use extract_text::ExtractText;
pub use filter_author::FilterAuthor;
pub use trim_text::TrimText;

/// Every built-in processor, in registration order.
pub fn builtin_processors() -> Vec<Arc<dyn Processor>> {
    vec![
        Arc::new(ExtractText::new()),
        Arc::new(ExtractHtml::new()),
        Arc::new(DedupUrl::new()),
        Arc::new(ExcludePhrases::new()),
        Arc::new(TrimText::new()),
        Arc::new(FilterAuthor::new()),
        Arc::new(ClusterTfidf::new()),
    ]
}
