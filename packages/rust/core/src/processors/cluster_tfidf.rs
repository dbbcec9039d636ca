//! `cluster_tfidf`: adapter from pipeline items to the clustering engine.
//!
//! Items pass through unchanged; clusters travel on the side channel.

use std::sync::Arc;

use tracing::debug;

use topicflow_shared::{ItemField, Result, SharedItem, TopicflowError};
use topicflow_text::{ClusterDocument, ClusterOptions, TitleStrategy, cluster};

use crate::params::Params;
use crate::processor::{ParamSchema, Processor, ProcessorDescriptor, ProcessorKind, ProcessorOutput};

pub const ID: &str = "cluster_tfidf";

pub struct ClusterTfidf {
    descriptor: ProcessorDescriptor,
}

impl ClusterTfidf {
    pub fn new() -> Self {
        let descriptor = ProcessorDescriptor::new(
            ID,
            ProcessorKind::Cluster,
            "TF-IDF clustering",
            "Groups similar documents by TF-IDF cosine similarity.",
        )
        .param(
            "threshold",
            ParamSchema::number("Similarity threshold (0-1)", 0.35, 0.1, 0.9, 0.05),
        )
        .param(
            "minClusterSize",
            ParamSchema::number("Minimum cluster size", 2.0, 2.0, 10.0, 1.0),
        )
        .param(
            "maxTerms",
            ParamSchema::number("Top terms per cluster", 10.0, 1.0, 50.0, 1.0),
        )
        .param(
            "titleStrategy",
            ParamSchema::choice("Cluster title", "terms", &["terms", "smart"]),
        )
        .requires_fields(&[ItemField::Text])
        .must_be_after(&[super::dedup_url::ID]);
        Self { descriptor }
    }
}

impl Default for ClusterTfidf {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ClusterTfidf {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn process(&self, items: &[SharedItem], params: &Params) -> Result<ProcessorOutput> {
        let opts = ClusterOptions {
            threshold: params.number("threshold")?,
            min_cluster_size: params.usize("minClusterSize")?,
            max_terms: params.usize("maxTerms")?,
            title_strategy: params
                .string("titleStrategy")?
                .parse::<TitleStrategy>()
                .map_err(|e| TopicflowError::invalid_params(ID, e))?,
        };

        let docs: Vec<ClusterDocument<'_>> = items
            .iter()
            .filter_map(|item| {
                item.text().map(|text| ClusterDocument {
                    id: item.id,
                    title: &item.title,
                    text,
                })
            })
            .collect();

        let outcome = cluster(&docs, &opts);
        let clustered: usize = outcome.clusters.iter().map(|c| c.documents.len()).sum();
        debug!(
            clusters = outcome.clusters.len(),
            clustered,
            singles = outcome.singles.len(),
            "clustering finished"
        );

        Ok(ProcessorOutput::new(items.iter().map(Arc::clone).collect())
            .with_meta("clustersCreated", outcome.clusters.len())
            .with_meta("threshold", opts.threshold)
            .with_meta("minClusterSize", opts.min_cluster_size)
            .with_meta("totalDocuments", items.len())
            .with_meta("itemsWithText", docs.len())
            .with_meta("itemsWithoutText", items.len() - docs.len())
            .with_meta("clusteredDocuments", clustered)
            .with_meta("singles", outcome.singles.len())
            .with_meta("belowTokenFloor", outcome.below_token_floor.len())
            .with_clusters(outcome.clusters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, news_items};
    use serde_json::json;

    fn run(items: &[SharedItem], config: serde_json::Value) -> ProcessorOutput {
        let processor = ClusterTfidf::new();
        let params = Params::resolve(processor.descriptor(), config.as_object().unwrap()).unwrap();
        processor.process(items, &params).unwrap()
    }

    #[test]
    fn clusters_related_news_and_keeps_all_items() {
        let items: Vec<SharedItem> = news_items().into_iter().map(Arc::new).collect();
        let out = run(&items, json!({}));

        assert_eq!(out.items.len(), items.len());
        for (a, b) in out.items.iter().zip(&items) {
            assert!(Arc::ptr_eq(a, b));
        }

        let clusters = out.clusters.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].mentions_count, 3);
        assert_eq!(out.metadata["clustersCreated"], 1);
        assert_eq!(out.metadata["clusteredDocuments"], 3);
        assert_eq!(out.metadata["singles"], 3);
        assert_eq!(out.metadata["itemsWithText"], 6);
        assert_eq!(out.metadata["threshold"], 0.35);
    }

    #[test]
    fn items_without_text_flow_through() {
        let mut items: Vec<SharedItem> = news_items().into_iter().map(Arc::new).collect();
        items.push(Arc::new(item(99, "https://news.example/99", "No text yet")));
        let out = run(&items, json!({}));

        assert_eq!(out.items.len(), 7);
        assert_eq!(out.items[6].id, 99);
        assert_eq!(out.metadata["itemsWithoutText"], 1);
        let clusters = out.clusters.unwrap();
        assert!(clusters.iter().all(|c| c.documents.iter().all(|d| d.id != 99)));
    }

    #[test]
    fn no_text_at_all_gives_empty_cluster_list() {
        let items = vec![Arc::new(item(1, "https://a.example/1", "Bare"))];
        let out = run(&items, json!({}));
        assert_eq!(out.clusters, Some(vec![]));
        assert_eq!(out.metadata["clustersCreated"], 0);
    }

    #[test]
    fn smart_titles_can_be_selected() {
        let items: Vec<SharedItem> = news_items().into_iter().map(Arc::new).collect();
        let out = run(&items, json!({"titleStrategy": "smart"}));
        let clusters = out.clusters.unwrap();
        assert!(clusters[0].title.starts_with("GPT: "), "{}", clusters[0].title);
    }
}
