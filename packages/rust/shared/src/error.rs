//! Error types for Topicflow.
//!
//! Library crates use [`TopicflowError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Topicflow operations.
#[derive(Debug, thiserror::Error)]
pub enum TopicflowError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A processor id was registered twice.
    #[error("processor with id \"{0}\" already registered")]
    DuplicateProcessor(String),

    /// A pipeline step references a processor missing from the registry.
    #[error("processor \"{0}\" not found")]
    UnknownProcessor(String),

    /// A step's config does not match the processor's parameter schema.
    #[error("invalid config for processor \"{processor}\": {message}")]
    InvalidParams { processor: String, message: String },

    /// The pipeline was rejected before any stage ran.
    #[error("pipeline validation failed: {message}")]
    Validation { message: String },

    /// The loader returned no items for the run.
    #[error("no documents found for run {run_id}")]
    EmptyBatch { run_id: i64 },

    /// A stage failed; fatal for the whole pipeline.
    #[error("processor \"{processor}\" failed: {message}")]
    Processor { processor: String, message: String },

    /// Malformed JSON or TOML input.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TopicflowError>;

impl TopicflowError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a params error for the given processor id.
    pub fn invalid_params(processor: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidParams {
            processor: processor.into(),
            message: msg.into(),
        }
    }

    /// Wrap a stage failure with the processor's human-readable name.
    pub fn processor(processor: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Processor {
            processor: processor.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TopicflowError::config("missing database path");
        assert_eq!(err.to_string(), "config error: missing database path");

        let err = TopicflowError::processor("Text trim", "boom");
        assert_eq!(err.to_string(), "processor \"Text trim\" failed: boom");

        let err = TopicflowError::EmptyBatch { run_id: 7 };
        assert!(err.to_string().contains("run 7"));
    }

    #[test]
    fn duplicate_processor_message_names_id() {
        let err = TopicflowError::DuplicateProcessor("dedup_url".into());
        assert!(err.to_string().contains("\"dedup_url\""));
    }
}
