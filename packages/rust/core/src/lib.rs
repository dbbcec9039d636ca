//! Pipeline orchestration for Topicflow.
//!
//! Processors are registered in a [`Registry`], composed into a
//! [`PipelineConfig`](topicflow_shared::PipelineConfig) and run over a
//! batch by the [`PipelineExecutor`].

pub mod executor;
pub mod loader;
pub mod params;
pub mod processor;
pub mod processors;
pub mod registry;

#[cfg(test)]
mod testing;

pub use executor::{
    ExecuteOptions, ExecuteResult, ExecutionObserver, ExecutionState, PipelineExecutor,
    SilentObserver, run_stages, run_stages_with, unshare,
};
pub use loader::{ItemLoader, MemoryLoader};
pub use params::Params;
pub use processor::{
    Constraints, ParamSchema, ParamType, Processor, ProcessorDescriptor, ProcessorKind,
    ProcessorOutput, Requirements,
};
pub use processors::builtin_processors;
pub use registry::{Registry, Severity, ValidationIssue, ValidationReport};
