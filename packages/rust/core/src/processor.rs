//! The processor contract: descriptors, parameter schemas and the
//! [`Processor`] trait every pipeline stage implements.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use topicflow_shared::{ClusterData, ContentType, ItemField, JsonMap, Result, SharedItem};

use crate::params::Params;

/// What a stage does to the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    /// Drops items.
    Filter,
    /// Rewrites items.
    Transform,
    /// Adds data to items.
    Enrich,
    /// Produces clusters; items pass through.
    Cluster,
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Filter => "filter",
            Self::Transform => "transform",
            Self::Enrich => "enrich",
            Self::Cluster => "cluster",
        };
        f.write_str(s)
    }
}

/// Data a processor expects. Only ever produces validation warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<ItemField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supported_content_types: Vec<ContentType>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_media: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_language: bool,
}

impl Requirements {
    pub fn is_empty(&self) -> bool {
        self.required_fields.is_empty()
            && self.supported_content_types.is_empty()
            && !self.requires_media
            && !self.requires_language
    }
}

/// Ordering rules checked before a pipeline runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// Listed processors, when present, must run earlier.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_be_after: Vec<String>,
    /// Listed processors, when present, must run later.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_be_before: Vec<String>,
    /// This processor may not be the step right after any of these.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cannot_follow: Vec<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.must_be_after.is_empty() && self.must_be_before.is_empty() && self.cannot_follow.is_empty()
    }
}

/// Value type of a processor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "string[]")]
    StringList,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::StringList => "string[]",
        };
        f.write_str(s)
    }
}

/// Declarative description of one parameter, enough to render a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSchema {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub label: String,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// A step of `1` marks an integer parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ParamSchema {
    fn new(param_type: ParamType, label: &str, default: Value) -> Self {
        Self {
            param_type,
            label: label.to_string(),
            default,
            min: None,
            max: None,
            step: None,
            placeholder: None,
            options: Vec::new(),
        }
    }

    /// A bounded number.
    pub fn number(label: &str, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            step: Some(step),
            ..Self::new(ParamType::Number, label, Value::from(default))
        }
    }

    pub fn boolean(label: &str, default: bool) -> Self {
        Self::new(ParamType::Boolean, label, Value::Bool(default))
    }

    /// A string restricted to `options`.
    pub fn choice(label: &str, default: &str, options: &[&str]) -> Self {
        Self {
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Self::new(ParamType::String, label, Value::from(default))
        }
    }

    /// A list of strings, empty by default.
    pub fn string_list(label: &str, placeholder: &str) -> Self {
        Self {
            placeholder: Some(placeholder.to_string()),
            ..Self::new(ParamType::StringList, label, Value::Array(Vec::new()))
        }
    }

    pub(crate) fn is_integer(&self) -> bool {
        self.step == Some(1.0)
    }
}

/// Static description of a processor, without its behavior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ProcessorKind,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Requirements::is_empty")]
    pub requirements: Requirements,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    pub schema: BTreeMap<String, ParamSchema>,
}

impl ProcessorDescriptor {
    pub fn new(id: &str, kind: ProcessorKind, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            description: description.to_string(),
            requirements: Requirements::default(),
            constraints: Constraints::default(),
            schema: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: &str, schema: ParamSchema) -> Self {
        self.schema.insert(name.to_string(), schema);
        self
    }

    pub fn requires_fields(mut self, fields: &[ItemField]) -> Self {
        self.requirements.required_fields = fields.to_vec();
        self
    }

    pub fn supports_only(mut self, content_types: &[ContentType]) -> Self {
        self.requirements.supported_content_types = content_types.to_vec();
        self
    }

    pub fn requires_media(mut self) -> Self {
        self.requirements.requires_media = true;
        self
    }

    pub fn requires_language(mut self) -> Self {
        self.requirements.requires_language = true;
        self
    }

    pub fn must_be_after(mut self, ids: &[&str]) -> Self {
        self.constraints.must_be_after = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn must_be_before(mut self, ids: &[&str]) -> Self {
        self.constraints.must_be_before = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn cannot_follow(mut self, ids: &[&str]) -> Self {
        self.constraints.cannot_follow = ids.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// What one stage hands to the next.
#[derive(Debug, Clone, Default)]
pub struct ProcessorOutput {
    /// Surviving items, in input order. Unchanged items are the same `Arc`s.
    pub items: Vec<SharedItem>,
    /// Present only for clustering stages.
    pub clusters: Option<Vec<ClusterData>>,
    /// Free-form stage statistics.
    pub metadata: JsonMap,
}

impl ProcessorOutput {
    pub fn new(items: Vec<SharedItem>) -> Self {
        Self {
            items,
            clusters: None,
            metadata: JsonMap::new(),
        }
    }

    pub fn with_clusters(mut self, clusters: Vec<ClusterData>) -> Self {
        self.clusters = Some(clusters);
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// A registered unit of pipeline work.
///
/// `process` must not mutate its input: items it changes are returned as
/// new records, the rest are passed through by cloning the `Arc`.
pub trait Processor: Send + Sync {
    fn descriptor(&self) -> &ProcessorDescriptor;

    /// Run the stage over the whole batch with parameters already resolved
    /// against [`ProcessorDescriptor::schema`].
    fn process(&self, items: &[SharedItem], params: &Params) -> Result<ProcessorOutput>;

    fn id(&self) -> &str {
        &self.descriptor().id
    }

    fn name(&self) -> &str {
        &self.descriptor().name
    }
}
