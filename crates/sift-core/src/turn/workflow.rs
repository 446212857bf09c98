//! Workflow step tracking.
//!
//! A turn's workflow is an ordered list of steps executed strictly one at a
//! time. At any instant at most one step is `Processing`, everything before
//! it is `Completed`, and everything after it is `Pending`.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::turn::ticker;

/// What kind of work a step represents. Drives the glyph shown in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Plan,
    File,
    Action,
    Thought,
}

/// Execution status of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Processing,
    Completed,
}

/// One workflow step with its status and timing bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    pub name: String,
    pub content: String,
    pub status: StepStatus,
    /// Simulated execution time for this step.
    pub duration_ms: u64,
    /// Wall time the step actually took, recorded at completion.
    pub elapsed_ms: Option<u64>,
}

impl Step {
    pub fn new(
        kind: StepKind,
        name: impl Into<String>,
        content: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            content: content.into(),
            status: StepStatus::Pending,
            duration_ms,
            elapsed_ms: None,
        }
    }
}

/// Checks the wavefront invariant: completed steps, then at most one
/// processing step, then pending steps.
pub fn wavefront_ok(steps: &[Step]) -> bool {
    let mut seen_processing = false;
    let mut seen_pending = false;
    for step in steps {
        match step.status {
            StepStatus::Completed => {
                if seen_processing || seen_pending {
                    return false;
                }
            }
            StepStatus::Processing => {
                if seen_processing || seen_pending {
                    return false;
                }
                seen_processing = true;
            }
            StepStatus::Pending => seen_pending = true,
        }
    }
    true
}

/// Runs the steps in order, emitting a snapshot after every status change.
///
/// Cancellation is checked before each step starts and while it runs.
/// Returns `None` if cancelled; no snapshot is emitted after cancellation.
pub async fn run_steps<F, Fut>(
    mut steps: Vec<Step>,
    cancel: &CancellationToken,
    mut emit: F,
) -> Option<Vec<Step>>
where
    F: FnMut(Vec<Step>) -> Fut,
    Fut: Future<Output = ()>,
{
    for i in 0..steps.len() {
        if cancel.is_cancelled() {
            return None;
        }
        steps[i].status = StepStatus::Processing;
        emit(steps.clone()).await;

        let started = tokio::time::Instant::now();
        if !ticker::delay(Duration::from_millis(steps[i].duration_ms), cancel).await {
            return None;
        }

        steps[i].status = StepStatus::Completed;
        steps[i].elapsed_ms = Some(started.elapsed().as_millis() as u64);
        emit(steps.clone()).await;
    }
    Some(steps)
}

/// Row of the brand comparison table in the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandRow {
    pub brand: String,
    pub strategy: String,
    pub sell_through: String,
    pub top3_share: String,
    pub price_band: String,
    pub conversion: String,
}

/// Structured report attached to the agent message when the turn completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub title: String,
    /// Category-level findings, one bullet per entry.
    pub overview: Vec<String>,
    pub brands: Vec<BrandRow>,
}
