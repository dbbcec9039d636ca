//! Processor registry and pipeline validation.
//!
//! The registry is built once at startup and only read afterwards, so it can
//! be shared between concurrent executions behind an `Arc` without locking.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use topicflow_shared::{PipelineConfig, PipelineStep, Result, SharedItem, TopicflowError};

use crate::params::param_problems;
use crate::processor::{Processor, ProcessorDescriptor};
use crate::processors::builtin_processors;

/// Id → processor mapping, in registration order.
#[derive(Default)]
pub struct Registry {
    processors: Vec<Arc<dyn Processor>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("processors", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in processor.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for processor in builtin_processors() {
            registry.register_arc(processor)?;
        }
        Ok(registry)
    }

    /// Add a processor. Registering an id twice is an error.
    pub fn register(&mut self, processor: impl Processor + 'static) -> Result<()> {
        self.register_arc(Arc::new(processor))
    }

    pub fn register_arc(&mut self, processor: Arc<dyn Processor>) -> Result<()> {
        let id = processor.id().to_string();
        if self.index.contains_key(&id) {
            return Err(TopicflowError::DuplicateProcessor(id));
        }
        debug!(processor = %id, "registered processor");
        self.index.insert(id, self.processors.len());
        self.processors.push(processor);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Processor>> {
        self.index.get(id).map(|&i| Arc::clone(&self.processors[i]))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Descriptors of all processors, in registration order.
    pub fn metadata(&self) -> Vec<ProcessorDescriptor> {
        self.processors
            .iter()
            .map(|p| p.descriptor().clone())
            .collect()
    }

    /// Check a pipeline against the registry and, optionally, a sample of
    /// the items it will run on.
    ///
    /// Unknown processor ids are reported and stop further checks. Ordering
    /// violations and invalid step configs are errors; a `mustBeAfter`
    /// processor missing from the pipeline and data-shape mismatches in the
    /// sample are warnings.
    pub fn validate(&self, pipeline: &PipelineConfig, sample: Option<&[SharedItem]>) -> ValidationReport {
        let steps = pipeline.enabled_steps();
        let mut report = ValidationReport::default();

        for step in &steps {
            if !self.contains(&step.processor_id) {
                report.errors.push(ValidationIssue::error(
                    &step.processor_id,
                    format!("processor \"{}\" is not registered", step.processor_id),
                ));
            }
        }
        if !report.errors.is_empty() {
            return report.finish();
        }

        let resolved: Vec<(&PipelineStep, Arc<dyn Processor>)> = steps
            .iter()
            .filter_map(|step| self.get(&step.processor_id).map(|p| (*step, p)))
            .collect();

        for (position, (step, processor)) in resolved.iter().enumerate() {
            check_ordering(&steps, position, step, processor.descriptor(), &mut report);

            for problem in param_problems(processor.descriptor(), &step.config) {
                report.errors.push(ValidationIssue::error(
                    &step.processor_id,
                    format!("invalid config for \"{}\": {problem}", processor.name()),
                ));
            }
        }

        if let Some(sample) = sample.filter(|s| !s.is_empty()) {
            for (step, processor) in &resolved {
                check_requirements(step, processor.descriptor(), sample, &mut report);
            }
        }

        for warning in &report.warnings {
            warn!(processor = %warning.processor_id, "{}", warning.message);
        }
        report.finish()
    }
}

fn check_ordering(
    steps: &[&PipelineStep],
    position: usize,
    step: &PipelineStep,
    descriptor: &ProcessorDescriptor,
    report: &mut ValidationReport,
) {
    let index_of = |id: &str| steps.iter().position(|s| s.processor_id == id);
    let constraints = &descriptor.constraints;

    for required in &constraints.must_be_after {
        match index_of(required) {
            None => report.warnings.push(ValidationIssue::warning(
                &step.processor_id,
                format!(
                    "processor \"{}\" should run after \"{required}\", which is not in the pipeline",
                    descriptor.name
                ),
            )),
            Some(idx) if idx >= position => report.errors.push(ValidationIssue::error(
                &step.processor_id,
                format!("processor \"{}\" must run after \"{required}\"", descriptor.name),
            )),
            Some(_) => {}
        }
    }

    for required in &constraints.must_be_before {
        if let Some(idx) = index_of(required) {
            if idx <= position {
                report.errors.push(ValidationIssue::error(
                    &step.processor_id,
                    format!("processor \"{}\" must run before \"{required}\"", descriptor.name),
                ));
            }
        }
    }

    if position > 0 {
        let previous = &steps[position - 1].processor_id;
        if constraints.cannot_follow.contains(previous) {
            report.errors.push(ValidationIssue::error(
                &step.processor_id,
                format!(
                    "processor \"{}\" cannot directly follow \"{previous}\"",
                    descriptor.name
                ),
            ));
        }
    }
}

fn check_requirements(
    step: &PipelineStep,
    descriptor: &ProcessorDescriptor,
    sample: &[SharedItem],
    report: &mut ValidationReport,
) {
    let total = sample.len();
    let requirements = &descriptor.requirements;
    let mut shortfall = |missing: usize, what: String, mut details: Value| {
        if missing == 0 {
            return;
        }
        let percent = (missing as f64 / total as f64 * 100.0).round();
        if let Value::Object(map) = &mut details {
            map.insert("totalCount".into(), total.into());
        }
        report.warnings.push(ValidationIssue {
            details: Some(details),
            ..ValidationIssue::warning(
                &step.processor_id,
                format!(
                    "processor \"{}\" {what}, but {missing} of {total} documents ({percent}%) do not",
                    descriptor.name
                ),
            )
        });
    };

    for field in &requirements.required_fields {
        let missing = sample.iter().filter(|item| !field.is_present(item)).count();
        shortfall(
            missing,
            format!("requires field \"{field}\""),
            json!({"field": field.as_str(), "missingCount": missing}),
        );
    }

    if !requirements.supported_content_types.is_empty() {
        let unsupported = sample
            .iter()
            .filter(|item| !requirements.supported_content_types.contains(&item.content_type))
            .count();
        let supported: Vec<&str> = requirements
            .supported_content_types
            .iter()
            .map(|c| c.as_str())
            .collect();
        shortfall(
            unsupported,
            format!("supports only {} content", supported.join(", ")),
            json!({"unsupportedCount": unsupported}),
        );
    }

    if requirements.requires_media {
        let missing = sample.iter().filter(|item| !item.has_media()).count();
        shortfall(
            missing,
            "requires media attachments".to_string(),
            json!({"missingCount": missing}),
        );
    }

    if requirements.requires_language {
        let missing = sample
            .iter()
            .filter(|item| item.language.as_deref().is_none_or(str::is_empty))
            .count();
        shortfall(
            missing,
            "requires a detected language".to_string(),
            json!({"missingCount": missing}),
        );
    }
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub processor_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ValidationIssue {
    fn error(processor_id: &str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            processor_id: processor_id.to_string(),
            message,
            details: None,
        }
    }

    fn warning(processor_id: &str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(processor_id, message)
        }
    }
}

/// Outcome of [`Registry::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }

    /// All error messages joined, for wrapping in a single error.
    pub fn error_message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
