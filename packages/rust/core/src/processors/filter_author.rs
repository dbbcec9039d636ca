//! `filter_author`: drop items whose author matches a blacklist entry.

use std::sync::Arc;

use tracing::debug;

use topicflow_shared::{ItemField, Result, SharedItem};

use crate::params::Params;
use crate::processor::{ParamSchema, Processor, ProcessorDescriptor, ProcessorKind, ProcessorOutput};

pub const ID: &str = "filter_author";

pub struct FilterAuthor {
    descriptor: ProcessorDescriptor,
}

impl FilterAuthor {
    pub fn new() -> Self {
        let descriptor = ProcessorDescriptor::new(
            ID,
            ProcessorKind::Filter,
            "Author blacklist",
            "Removes documents by the listed authors (case-insensitive substring match).",
        )
        .param(
            "blacklist",
            ParamSchema::string_list("Authors to exclude", "Type an author and press Enter"),
        )
        .requires_fields(&[ItemField::Author]);
        Self { descriptor }
    }
}

impl Default for FilterAuthor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for FilterAuthor {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn process(&self, items: &[SharedItem], params: &Params) -> Result<ProcessorOutput> {
        let blacklist = params.string_list("blacklist")?;
        let blocked: Vec<String> = blacklist
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();

        let kept: Vec<SharedItem> = items
            .iter()
            .filter(|item| match item.author() {
                Some(author) => {
                    let author = author.to_lowercase();
                    !blocked.iter().any(|b| author.contains(b.as_str()))
                }
                None => true,
            })
            .map(Arc::clone)
            .collect();

        let excluded = items.len() - kept.len();
        debug!(excluded, "authors filtered");

        Ok(ProcessorOutput::new(kept)
            .with_meta("excludedCount", excluded)
            .with_meta("blacklist", blacklist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::text_item;
    use serde_json::json;

    fn authored(id: i64, author: Option<&str>) -> SharedItem {
        let mut item = text_item(id, "Post", "body");
        item.author = author.map(str::to_string);
        Arc::new(item)
    }

    #[test]
    fn blacklisted_authors_are_removed() {
        let items = vec![
            authored(1, Some("PR Bot 3000")),
            authored(2, Some("Jane Roe")),
            authored(3, None),
            authored(4, Some("")),
        ];
        let processor = FilterAuthor::new();
        let params = Params::resolve(
            processor.descriptor(),
            json!({"blacklist": ["pr bot"]}).as_object().unwrap(),
        )
        .unwrap();
        let out = processor.process(&items, &params).unwrap();

        let ids: Vec<i64> = out.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(out.metadata["excludedCount"], 1);
        assert_eq!(out.metadata["blacklist"], json!(["pr bot"]));
    }
}
