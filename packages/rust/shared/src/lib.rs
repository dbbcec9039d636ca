//! Shared types, error model, and configuration for Topicflow.
//!
//! This crate is the foundation depended on by all other Topicflow crates.
//! It provides:
//! - [`TopicflowError`]: the unified error type
//! - Domain types ([`ProcessingItem`], [`PipelineConfig`], [`ClusterData`], [`StageStats`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, PipelineDefaults, config_dir, config_file_path, init_config,
    load_config, load_config_from, load_pipeline_from,
};
pub use error::{Result, TopicflowError};
pub use types::{
    ClusterData, ClusterMember, ContentType, ItemField, JsonMap, Media, MediaImage, MediaVideo,
    PipelineConfig, PipelineStep, ProcessingItem, SharedItem, StageStats, TopTerm,
};
