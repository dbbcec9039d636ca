//! Spinner-driven [`ExecutionObserver`] for interactive runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use topicflow_core::{ExecutionObserver, ExecutionState};
use topicflow_shared::StageStats;

/// Shows the current stage on a spinner and prints a line per finished stage.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid spinner template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ExecutionObserver for CliProgress {
    fn state_changed(&self, state: &ExecutionState) {
        match state {
            ExecutionState::Loading => self.spinner.set_message("Loading documents"),
            ExecutionState::Validating => self.spinner.set_message("Validating pipeline"),
            ExecutionState::Running {
                index,
                total,
                processor_name,
                ..
            } => self
                .spinner
                .set_message(format!("[{}/{total}] {processor_name}", index + 1)),
            ExecutionState::Completed | ExecutionState::Failed { .. } => {
                self.spinner.finish_and_clear();
            }
        }
    }

    fn stage_completed(&self, stats: &StageStats) {
        self.spinner.println(format!(
            "  ✓ {} ({} → {}, {}ms)",
            stats.processor_name, stats.items_in, stats.items_out, stats.duration_ms
        ));
    }
}
