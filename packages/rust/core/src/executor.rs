//! Pipeline executor: load → validate → run each enabled step in order.
//!
//! Stages run strictly one after another over the whole batch. The first
//! failing stage aborts the run; there is no retry and no partial result.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use topicflow_shared::{
    ClusterData, PipelineConfig, ProcessingItem, Result, SharedItem, StageStats, TopicflowError,
};

use crate::loader::ItemLoader;
use crate::params::Params;
use crate::registry::{Registry, ValidationIssue};

/// Options for [`PipelineExecutor::execute`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Load at most this many items (previews). `Some(0)` loads the whole batch.
    pub sample_limit: Option<usize>,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecuteResult {
    pub stages: Vec<StageStats>,
    pub items: Vec<SharedItem>,
    /// Output of the last clustering stage; `None` if none ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clusters: Option<Vec<ClusterData>>,
    pub warnings: Vec<ValidationIssue>,
}

impl ExecuteResult {
    /// Sum of stage durations in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.duration_ms).sum()
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionState {
    Loading,
    Validating,
    Running {
        /// Zero-based position among the enabled steps.
        index: usize,
        total: usize,
        processor_id: String,
        processor_name: String,
    },
    Completed,
    Failed { message: String },
}

/// Receives progress from a run, e.g. to drive a spinner.
pub trait ExecutionObserver {
    fn state_changed(&self, state: &ExecutionState);
    fn stage_completed(&self, stats: &StageStats);
}

/// No-op observer for headless/test usage.
pub struct SilentObserver;

impl ExecutionObserver for SilentObserver {
    fn state_changed(&self, _state: &ExecutionState) {}
    fn stage_completed(&self, _stats: &StageStats) {}
}

/// Runs pipelines against batches fetched through an [`ItemLoader`].
///
/// Holds no per-run state; one executor can serve any number of runs.
pub struct PipelineExecutor<L> {
    registry: Arc<Registry>,
    loader: L,
}

impl<L: ItemLoader> PipelineExecutor<L> {
    pub fn new(registry: Arc<Registry>, loader: L) -> Self {
        Self { registry, loader }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub async fn execute(
        &self,
        run_id: i64,
        pipeline: &PipelineConfig,
        opts: ExecuteOptions,
    ) -> Result<ExecuteResult> {
        self.execute_with(run_id, pipeline, opts, &SilentObserver).await
    }

    /// Execute, reporting state changes and finished stages to `observer`.
    #[instrument(skip_all, fields(run_id, sample_limit = ?opts.sample_limit))]
    pub async fn execute_with(
        &self,
        run_id: i64,
        pipeline: &PipelineConfig,
        opts: ExecuteOptions,
        observer: &dyn ExecutionObserver,
    ) -> Result<ExecuteResult> {
        observer.state_changed(&ExecutionState::Loading);
        let items = match self.load(run_id, opts).await {
            Ok(items) => items,
            Err(e) => return Err(fail(observer, e)),
        };
        run_stages_with(&self.registry, run_id, pipeline, items, observer)
    }

    async fn load(&self, run_id: i64, opts: ExecuteOptions) -> Result<Vec<SharedItem>> {
        let items = self.loader.load_batch(run_id, opts.sample_limit).await?;
        if items.is_empty() {
            return Err(TopicflowError::EmptyBatch { run_id });
        }
        info!(run_id, count = items.len(), "loaded batch");
        Ok(items.into_iter().map(Arc::new).collect())
    }
}

/// Validate and run a pipeline over items the caller already holds.
pub fn run_stages(
    registry: &Registry,
    run_id: i64,
    pipeline: &PipelineConfig,
    items: Vec<SharedItem>,
) -> Result<ExecuteResult> {
    run_stages_with(registry, run_id, pipeline, items, &SilentObserver)
}

/// [`run_stages`] with progress reporting.
#[instrument(skip_all, fields(run_id, items = items.len()))]
pub fn run_stages_with(
    registry: &Registry,
    run_id: i64,
    pipeline: &PipelineConfig,
    items: Vec<SharedItem>,
    observer: &dyn ExecutionObserver,
) -> Result<ExecuteResult> {
    match run_validated(registry, pipeline, items, observer) {
        Ok(result) => {
            observer.state_changed(&ExecutionState::Completed);
            info!(
                run_id,
                stages = result.stages.len(),
                items = result.items.len(),
                clusters = result.clusters.as_ref().map_or(0, Vec::len),
                duration_ms = result.total_duration_ms(),
                "pipeline completed"
            );
            Ok(result)
        }
        Err(e) => Err(fail(observer, e)),
    }
}

fn run_validated(
    registry: &Registry,
    pipeline: &PipelineConfig,
    items: Vec<SharedItem>,
    observer: &dyn ExecutionObserver,
) -> Result<ExecuteResult> {
    observer.state_changed(&ExecutionState::Validating);
    let report = registry.validate(pipeline, Some(&items));
    if !report.valid {
        return Err(TopicflowError::validation(report.error_message()));
    }

    let steps = pipeline.enabled_steps();
    let total = steps.len();
    let mut current = items;
    let mut clusters = None;
    let mut stages = Vec::with_capacity(total);

    for (index, step) in steps.into_iter().enumerate() {
        // Validation saw this id, but the registry may have been swapped since.
        let processor = registry
            .get(&step.processor_id)
            .ok_or_else(|| TopicflowError::UnknownProcessor(step.processor_id.clone()))?;

        observer.state_changed(&ExecutionState::Running {
            index,
            total,
            processor_id: step.processor_id.clone(),
            processor_name: processor.name().to_string(),
        });

        let params = Params::resolve(processor.descriptor(), &step.config)?;
        let items_in = current.len();
        let started = Instant::now();
        let output = processor
            .process(&current, &params)
            .map_err(|e| TopicflowError::processor(processor.name(), e.to_string()))?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let items_out = output.items.len();
        let stats = StageStats {
            order: step.order,
            processor_id: step.processor_id.clone(),
            processor_name: processor.name().to_string(),
            items_in,
            items_out,
            items_removed: items_in.saturating_sub(items_out),
            clusters_created: output.clusters.as_ref().map(Vec::len),
            duration_ms,
            metadata: output.metadata,
        };
        info!(
            processor = %stats.processor_id,
            items_in,
            items_out,
            duration_ms,
            "stage finished"
        );
        observer.stage_completed(&stats);
        stages.push(stats);

        current = output.items;
        // Last clustering stage wins.
        if output.clusters.is_some() {
            clusters = output.clusters;
        }
    }

    Ok(ExecuteResult {
        stages,
        items: current,
        clusters,
        warnings: report.warnings,
    })
}

fn fail(observer: &dyn ExecutionObserver, error: TopicflowError) -> TopicflowError {
    warn!(error = %error, "pipeline failed");
    observer.state_changed(&ExecutionState::Failed {
        message: error.to_string(),
    });
    error
}

/// Clone the items out of their `Arc`s, e.g. for serialization elsewhere.
pub fn unshare(items: &[SharedItem]) -> Vec<ProcessingItem> {
    items.iter().map(|item| ProcessingItem::clone(item)).collect()
}
