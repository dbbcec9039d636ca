//! `trim_text`: cap text length, marking cut text with an ellipsis.

use std::sync::Arc;

use tracing::debug;

use topicflow_shared::{ItemField, Result, SharedItem};

use crate::params::Params;
use crate::processor::{ParamSchema, Processor, ProcessorDescriptor, ProcessorKind, ProcessorOutput};

pub const ID: &str = "trim_text";

/// Appended to truncated text.
pub const ELLIPSIS: &str = "...";

pub struct TrimText {
    descriptor: ProcessorDescriptor,
}

impl TrimText {
    pub fn new() -> Self {
        let descriptor = ProcessorDescriptor::new(
            ID,
            ProcessorKind::Transform,
            "Text trim",
            "Truncates document text to the configured maximum length.",
        )
        .param(
            "maxLength",
            ParamSchema::number("Maximum text length (characters)", 500.0, 100.0, 5000.0, 100.0),
        )
        .requires_fields(&[ItemField::Text]);
        Self { descriptor }
    }
}

impl Default for TrimText {
    fn default() -> Self {
        Self::new()
    }
}

/// First `max_chars` characters plus [`ELLIPSIS`], or `None` if `text` fits.
fn truncate(text: &str, max_chars: usize) -> Option<String> {
    let (cut, _) = text.char_indices().nth(max_chars)?;
    Some(format!("{}{ELLIPSIS}", &text[..cut]))
}

impl Processor for TrimText {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn process(&self, items: &[SharedItem], params: &Params) -> Result<ProcessorOutput> {
        let max_length = params.usize("maxLength")?;
        let mut trimmed = 0usize;

        let out = items
            .iter()
            .map(|item| match item.text().and_then(|t| truncate(t, max_length)) {
                Some(short) => {
                    trimmed += 1;
                    Arc::new(item.with_text(short))
                }
                None => Arc::clone(item),
            })
            .collect();

        debug!(trimmed, max_length, "text trimmed");

        Ok(ProcessorOutput::new(out)
            .with_meta("maxLength", max_length)
            .with_meta("trimmedCount", trimmed))
    }
}
