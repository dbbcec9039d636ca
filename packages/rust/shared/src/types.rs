//! Core domain types shared by the pipeline, clustering engine and storage.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form key/value mapping used for step configs and stage metadata.
pub type JsonMap = Map<String, Value>;

/// Items travel between stages behind `Arc`: untouched items are shared,
/// modified items are fresh allocations.
pub type SharedItem = Arc<ProcessingItem>;

// ---------------------------------------------------------------------------
// ProcessingItem
// ---------------------------------------------------------------------------

/// Format of an item's raw content body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    Json,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown content type \"{other}\"")),
        }
    }
}

/// An image attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A video attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaVideo {
    pub url: String,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// Media attachments (Telegram posts, HTML pages with pictures, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<MediaImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<MediaVideo>,
}

impl Media {
    /// `true` when there is neither an image nor a video.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty()
    }
}

/// One document flowing through the pipeline.
///
/// Built once per batch by the loader and never mutated afterwards: a stage
/// that changes an item produces a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingItem {
    /// Unique within a batch.
    pub id: i64,
    pub source_id: i64,
    pub source_name: String,
    pub url: String,
    pub title: String,
    /// Plain text; absent until an extraction stage fills it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
    pub raw_item_id: i64,
    pub raw_content: String,
    pub content_type: ContentType,
    pub fetched_at: DateTime<Utc>,
}

impl ProcessingItem {
    /// The item's text, treating an empty string the same as a missing one.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// The item's author, treating an empty string the same as a missing one.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref().filter(|a| !a.is_empty())
    }

    /// `true` when at least one image or video is attached.
    pub fn has_media(&self) -> bool {
        self.media.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Copy of this item with `text` replaced.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..self.clone()
        }
    }
}

/// Item fields a processor can declare as required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemField {
    Id,
    SourceId,
    SourceName,
    Url,
    Title,
    Text,
    Author,
    Language,
    PublishedAt,
    Media,
    Metadata,
    RawItemId,
    RawContent,
    ContentType,
    FetchedAt,
}

impl ItemField {
    /// Field name as it appears in serialized items.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::SourceId => "sourceId",
            Self::SourceName => "sourceName",
            Self::Url => "url",
            Self::Title => "title",
            Self::Text => "text",
            Self::Author => "author",
            Self::Language => "language",
            Self::PublishedAt => "publishedAt",
            Self::Media => "media",
            Self::Metadata => "metadata",
            Self::RawItemId => "rawItemId",
            Self::RawContent => "rawContent",
            Self::ContentType => "contentType",
            Self::FetchedAt => "fetchedAt",
        }
    }

    /// Whether `item` carries a value for this field.
    pub fn is_present(&self, item: &ProcessingItem) -> bool {
        match self {
            Self::Text => item.text.is_some(),
            Self::Author => item.author.is_some(),
            Self::Language => item.language.is_some(),
            Self::PublishedAt => item.published_at.is_some(),
            Self::Media => item.media.is_some(),
            Self::Metadata => item.metadata.is_some(),
            Self::Id
            | Self::SourceId
            | Self::SourceName
            | Self::Url
            | Self::Title
            | Self::RawItemId
            | Self::RawContent
            | Self::ContentType
            | Self::FetchedAt => true,
        }
    }
}

impl std::fmt::Display for ItemField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// One step of a pipeline: a processor reference plus its config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    /// Sort key among enabled steps; need not be contiguous.
    pub order: i64,
    /// Registered processor id.
    #[serde(rename = "id", alias = "processorId")]
    pub processor_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub config: JsonMap,
}

fn default_enabled() -> bool {
    true
}

impl PipelineStep {
    /// An enabled step with an empty config.
    pub fn new(order: i64, processor_id: impl Into<String>) -> Self {
        Self {
            order,
            processor_id: processor_id.into(),
            enabled: true,
            config: JsonMap::new(),
        }
    }

    /// Builder-style config entry.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Ordered, enable-flagged list of processor steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub processors: Vec<PipelineStep>,
}

impl PipelineConfig {
    pub fn new(processors: Vec<PipelineStep>) -> Self {
        Self { processors }
    }

    /// Enabled steps sorted by `order`; ties keep their list position.
    pub fn enabled_steps(&self) -> Vec<&PipelineStep> {
        let mut steps: Vec<&PipelineStep> =
            self.processors.iter().filter(|s| s.enabled).collect();
        steps.sort_by_key(|s| s.order);
        steps
    }
}

// ---------------------------------------------------------------------------
// Clusters and stage statistics
// ---------------------------------------------------------------------------

/// A term and its aggregated TF-IDF weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTerm {
    pub term: String,
    pub weight: f64,
}

/// A cluster member and its similarity to the cluster's seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub id: i64,
    pub similarity: f64,
}

/// Output of the clustering stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterData {
    pub title: String,
    pub mentions_count: usize,
    pub top_terms: Vec<TopTerm>,
    /// Mean similarity of the non-seed members to the seed.
    pub avg_similarity: f64,
    /// Seed first (similarity 1.0), then members in scan order.
    pub documents: Vec<ClusterMember>,
}

/// Per-stage record collected by the executor. Observability only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStats {
    pub order: i64,
    pub processor_id: String,
    pub processor_name: String,
    pub items_in: usize,
    pub items_out: usize,
    pub items_removed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters_created: Option<usize>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub metadata: JsonMap,
}
