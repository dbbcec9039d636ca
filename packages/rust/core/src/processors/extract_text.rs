//! `extract_text`: fill `text` from the raw content of html, text and json items.

use std::sync::Arc;

use tracing::debug;

use topicflow_extract::{HtmlOptions, html_to_text, json_to_text, normalize_whitespace};
use topicflow_shared::{ContentType, ProcessingItem, Result, SharedItem};

use crate::params::Params;
use crate::processor::{ParamSchema, Processor, ProcessorDescriptor, ProcessorKind, ProcessorOutput};

pub const ID: &str = "extract_text";

pub struct ExtractText {
    descriptor: ProcessorDescriptor,
}

impl ExtractText {
    pub fn new() -> Self {
        let descriptor = ProcessorDescriptor::new(
            ID,
            ProcessorKind::Transform,
            "Text extraction (raw → text)",
            "Fills item text from the raw content of html, text and json items.",
        )
        .param(
            "stripTags",
            ParamSchema::boolean("Clean HTML (drop script/style, keep body text only)", true),
        )
        .param(
            "minLength",
            ParamSchema::number("Minimum text length", 10.0, 0.0, 500.0, 1.0),
        )
        .must_be_before(&[super::cluster_tfidf::ID]);
        Self { descriptor }
    }
}

impl Default for ExtractText {
    fn default() -> Self {
        Self::new()
    }
}

fn extract(item: &ProcessingItem, html_opts: &HtmlOptions) -> String {
    match item.content_type {
        ContentType::Html => html_to_text(&item.raw_content, html_opts),
        ContentType::Text => normalize_whitespace(&item.raw_content),
        ContentType::Json => json_to_text(&item.raw_content).unwrap_or_default(),
    }
}

impl Processor for ExtractText {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn process(&self, items: &[SharedItem], params: &Params) -> Result<ProcessorOutput> {
        let strip_tags = params.boolean("stripTags")?;
        let min_length = params.usize("minLength")?;
        let html_opts = HtmlOptions {
            body_only: strip_tags,
            ..HtmlOptions::default()
        };

        let mut extracted = 0usize;
        let mut already_had_text = 0usize;
        let mut too_short = 0usize;

        let out = items
            .iter()
            .map(|item| {
                if item.text().is_some() {
                    already_had_text += 1;
                    return Arc::clone(item);
                }
                let text = extract(item, &html_opts);
                if text.is_empty() || text.chars().count() < min_length {
                    too_short += 1;
                    return Arc::clone(item);
                }
                extracted += 1;
                Arc::new(item.with_text(text))
            })
            .collect();

        debug!(extracted, already_had_text, too_short, "text extracted");

        Ok(ProcessorOutput::new(out)
            .with_meta("extractedCount", extracted)
            .with_meta("skippedAlreadyHasText", already_had_text)
            .with_meta("tooShortCount", too_short)
            .with_meta("total", items.len())
            .with_meta("minLength", min_length)
            .with_meta("stripTags", strip_tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{html_item, item, text_item};
    use serde_json::json;

    fn run(items: Vec<ProcessingItem>, config: serde_json::Value) -> ProcessorOutput {
        let processor = ExtractText::new();
        let params = Params::resolve(
            processor.descriptor(),
            config.as_object().unwrap(),
        )
        .unwrap();
        let shared: Vec<SharedItem> = items.into_iter().map(Arc::new).collect();
        processor.process(&shared, &params).unwrap()
    }

    #[test]
    fn extracts_from_each_content_type() {
        let html = html_item(
            1,
            "https://a.example/1",
            "<html><body><script>x()</script><p>Hello   from the body</p></body></html>",
        );
        let mut plain = item(2, "https://a.example/2", "Plain");
        plain.raw_content = "  plain\n\ntext body here ".into();
        let mut json = item(3, "https://a.example/3", "Json");
        json.content_type = ContentType::Json;
        json.raw_content = r#"{"data": {"content": "json body text"}}"#.into();

        let out = run(vec![html, plain, json], json!({}));
        assert_eq!(out.items[0].text(), Some("Hello from the body"));
        assert_eq!(out.items[1].text(), Some("plain text body here"));
        assert_eq!(out.items[2].text(), Some("json body text"));
        assert_eq!(out.metadata["extractedCount"], 3);
    }

    #[test]
    fn existing_text_passes_through_untouched() {
        let shared = Arc::new(text_item(1, "Title", "already here"));
        let processor = ExtractText::new();
        let params = Params::resolve(processor.descriptor(), &Default::default()).unwrap();
        let out = processor.process(&[Arc::clone(&shared)], &params).unwrap();

        assert!(Arc::ptr_eq(&out.items[0], &shared));
        assert_eq!(out.metadata["skippedAlreadyHasText"], 1);
        assert_eq!(out.metadata["extractedCount"], 0);
    }

    #[test]
    fn short_results_are_discarded() {
        let short = html_item(1, "https://a.example/1", "<body><p>tiny</p></body>");
        let out = run(vec![short], json!({"minLength": 10}));
        assert_eq!(out.items[0].text, None);
        assert_eq!(out.metadata["tooShortCount"], 1);
        assert_eq!(out.metadata["minLength"], 10);
    }

    #[test]
    fn strip_tags_off_reads_the_whole_document() {
        let page = html_item(
            1,
            "https://a.example/1",
            "<html><head><title>Head title</title></head><body><p>Body text here</p></body></html>",
        );
        let out = run(vec![page.clone()], json!({"stripTags": false}));
        assert_eq!(out.items[0].text(), Some("Head title Body text here"));

        let out = run(vec![page], json!({}));
        assert_eq!(out.items[0].text(), Some("Body text here"));
    }

    #[test]
    fn invalid_json_is_too_short_not_an_error() {
        let mut broken = item(1, "https://a.example/1", "Broken");
        broken.content_type = ContentType::Json;
        broken.raw_content = "{oops".into();
        let out = run(vec![broken], json!({}));
        assert_eq!(out.items[0].text, None);
        assert_eq!(out.metadata["tooShortCount"], 1);
    }
}
