//! `exclude_phrases`: drop items whose title or text contains a configured phrase.

use std::sync::Arc;

use tracing::debug;

use topicflow_shared::{ItemField, Result, SharedItem};

use crate::params::Params;
use crate::processor::{ParamSchema, Processor, ProcessorDescriptor, ProcessorKind, ProcessorOutput};

pub const ID: &str = "exclude_phrases";

pub struct ExcludePhrases {
    descriptor: ProcessorDescriptor,
}

impl ExcludePhrases {
    pub fn new() -> Self {
        let descriptor = ProcessorDescriptor::new(
            ID,
            ProcessorKind::Filter,
            "Phrase exclusion",
            "Removes documents containing any of the phrases (case-insensitive).",
        )
        .param(
            "phrases",
            ParamSchema::string_list("Phrases to exclude", "Type a phrase and press Enter"),
        )
        .requires_fields(&[ItemField::Text])
        .must_be_before(&[super::trim_text::ID]);
        Self { descriptor }
    }
}

impl Default for ExcludePhrases {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ExcludePhrases {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn process(&self, items: &[SharedItem], params: &Params) -> Result<ProcessorOutput> {
        let phrases = params.string_list("phrases")?;
        // An empty phrase would match everything.
        let needles: Vec<String> = phrases
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let kept: Vec<SharedItem> = items
            .iter()
            .filter(|item| {
                let Some(text) = item.text() else {
                    return true;
                };
                if needles.is_empty() {
                    return true;
                }
                let title = item.title.to_lowercase();
                let text = text.to_lowercase();
                !needles
                    .iter()
                    .any(|n| title.contains(n.as_str()) || text.contains(n.as_str()))
            })
            .map(Arc::clone)
            .collect();

        let excluded = items.len() - kept.len();
        debug!(excluded, phrases = needles.len(), "phrases excluded");

        Ok(ProcessorOutput::new(kept)
            .with_meta("excludedCount", excluded)
            .with_meta("phrases", phrases))
    }
}
