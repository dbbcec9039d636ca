//! `extract_html`: fill `text` from HTML bodies with switchable script/style stripping.

use std::sync::Arc;

use tracing::debug;

use topicflow_extract::{HtmlOptions, html_to_text};
use topicflow_shared::{ContentType, Result, SharedItem};

use crate::params::Params;
use crate::processor::{ParamSchema, Processor, ProcessorDescriptor, ProcessorKind, ProcessorOutput};

pub const ID: &str = "extract_html";

pub struct ExtractHtml {
    descriptor: ProcessorDescriptor,
}

impl ExtractHtml {
    pub fn new() -> Self {
        let descriptor = ProcessorDescriptor::new(
            ID,
            ProcessorKind::Transform,
            "HTML extraction",
            "Extracts body text from html raw content into item text.",
        )
        .param("stripScripts", ParamSchema::boolean("Drop <script> tags", true))
        .param("stripStyles", ParamSchema::boolean("Drop <style> tags", true))
        .supports_only(&[ContentType::Html])
        .must_be_before(&[super::cluster_tfidf::ID])
        .cannot_follow(&[super::extract_text::ID]);
        Self { descriptor }
    }
}

impl Default for ExtractHtml {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ExtractHtml {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn process(&self, items: &[SharedItem], params: &Params) -> Result<ProcessorOutput> {
        let opts = HtmlOptions {
            strip_scripts: params.boolean("stripScripts")?,
            strip_styles: params.boolean("stripStyles")?,
            body_only: true,
        };

        let mut extracted = 0usize;
        let mut skipped_non_html = 0usize;
        let mut already_had_text = 0usize;
        let mut empty = 0usize;

        let out = items
            .iter()
            .map(|item| {
                if item.content_type != ContentType::Html {
                    skipped_non_html += 1;
                    return Arc::clone(item);
                }
                if item.text().is_some() {
                    already_had_text += 1;
                    return Arc::clone(item);
                }
                let text = html_to_text(&item.raw_content, &opts);
                if text.is_empty() {
                    empty += 1;
                    return Arc::clone(item);
                }
                extracted += 1;
                Arc::new(item.with_text(text))
            })
            .collect();

        debug!(extracted, skipped_non_html, already_had_text, empty, "html extracted");

        Ok(ProcessorOutput::new(out)
            .with_meta("extractedCount", extracted)
            .with_meta("skippedNonHtml", skipped_non_html)
            .with_meta("alreadyHadText", already_had_text)
            .with_meta("emptyCount", empty)
            .with_meta("total", items.len()))
    }
}
