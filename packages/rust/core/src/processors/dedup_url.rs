//! `dedup_url`: keep the first item per normalized URL.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use topicflow_extract::normalize_url;
use topicflow_shared::{Result, SharedItem};

use crate::params::Params;
use crate::processor::{Processor, ProcessorDescriptor, ProcessorKind, ProcessorOutput};

pub const ID: &str = "dedup_url";

pub struct DedupUrl {
    descriptor: ProcessorDescriptor,
}

impl DedupUrl {
    pub fn new() -> Self {
        let descriptor = ProcessorDescriptor::new(
            ID,
            ProcessorKind::Filter,
            "URL dedup",
            "Removes documents whose normalized URL was already seen; the first occurrence is kept.",
        );
        Self { descriptor }
    }
}

impl Default for DedupUrl {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for DedupUrl {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn process(&self, items: &[SharedItem], _params: &Params) -> Result<ProcessorOutput> {
        let mut seen = HashSet::new();
        let mut unnormalizable = 0usize;
        let mut kept = Vec::with_capacity(items.len());

        for item in items {
            match normalize_url(&item.url) {
                Some(key) => {
                    if seen.insert(key) {
                        kept.push(Arc::clone(item));
                    }
                }
                // Cannot prove it is a duplicate, so keep it.
                None => {
                    unnormalizable += 1;
                    kept.push(Arc::clone(item));
                }
            }
        }

        let removed = items.len() - kept.len();
        debug!(removed, unnormalizable, "deduplicated by url");

        Ok(ProcessorOutput::new(kept)
            .with_meta("duplicatesRemoved", removed)
            .with_meta("unnormalizableUrls", unnormalizable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::item;

    fn run(urls: &[&str]) -> ProcessorOutput {
        let items: Vec<SharedItem> = urls
            .iter()
            .enumerate()
            .map(|(i, url)| Arc::new(item(i as i64 + 1, url, "Story")))
            .collect();
        let processor = DedupUrl::new();
        let params = Params::resolve(processor.descriptor(), &Default::default()).unwrap();
        processor.process(&items, &params).unwrap()
    }

    #[test]
    fn keeps_first_occurrence_in_order() {
        let out = run(&[
            "https://news.example/a?id=1",
            "https://NEWS.example/a/?id=1&utm_source=tg#top",
            "https://news.example/c",
        ]);
        let ids: Vec<i64> = out.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(out.metadata["duplicatesRemoved"], 1);
        assert_eq!(out.metadata["unnormalizableUrls"], 0);
    }

    #[test]
    fn unnormalizable_urls_are_always_kept() {
        let out = run(&["not a url", "not a url", "mailto:someone@example.com"]);
        assert_eq!(out.items.len(), 3);
        assert_eq!(out.metadata["duplicatesRemoved"], 0);
        assert_eq!(out.metadata["unnormalizableUrls"], 3);
    }

    #[test]
    fn query_order_does_not_matter() {
        let out = run(&["https://x.example/p?b=2&a=1", "https://x.example/p?a=1&b=2"]);
        assert_eq!(out.items.len(), 1);
    }
}
