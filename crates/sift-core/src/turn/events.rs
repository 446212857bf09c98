//! Turn event types for streaming to the TUI.
//!
//! This module defines the contract for events emitted by a running turn.
//! Events are serializable for future JSON output mode support.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::turn::workflow::{FinalReport, Step};

/// Lifecycle stage of an agent turn.
///
/// A turn only moves forward through these, never backward. A cancelled turn
/// simply stops emitting; its message keeps whatever stage it had reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Streaming the internal reasoning log.
    Thinking,
    /// Streaming the visible reply text.
    Speaking,
    /// Executing workflow steps.
    WorkflowRunning,
    /// Terminal stage; the message is immutable from here on.
    Completed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Thinking => write!(f, "thinking"),
            Stage::Speaking => write!(f, "speaking"),
            Stage::WorkflowRunning => write!(f, "workflow_running"),
            Stage::Completed => write!(f, "completed"),
        }
    }
}

/// Events emitted by a turn during execution.
///
/// Text-bearing events carry full accumulated snapshots rather than deltas,
/// so dropping an intermediate event under backpressure loses nothing once a
/// later snapshot arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Turn has started processing.
    TurnStarted,

    /// Turn entered a new stage.
    StageChanged { stage: Stage },

    /// Accumulated reasoning log so far.
    ThinkingUpdate { text: String },

    /// Accumulated reply text so far.
    ReplyUpdate { text: String },

    /// Current workflow step statuses.
    StepsUpdate { steps: Vec<Step> },

    /// Final structured report is available.
    ReportReady { report: FinalReport },

    /// Turn completed successfully.
    TurnCompleted,
}

/// Channel-based event sender (async, bounded).
///
/// Events are wrapped in `Arc` for efficient cloning to multiple consumers.
pub type TurnEventTx = mpsc::Sender<Arc<TurnEvent>>;

/// Channel-based event receiver (async, bounded).
pub type TurnEventRx = mpsc::Receiver<Arc<TurnEvent>>;

/// Default channel capacity for event streams.
///
/// Set higher (128) to accommodate best-effort snapshot sends without blocking.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Creates a bounded event channel with the default capacity.
pub fn create_event_channel() -> (TurnEventTx, TurnEventRx) {
    mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY)
}

/// Event sender wrapper that provides best-effort and reliable send modes.
///
/// Use `send_snapshot()` for high-volume events (`ThinkingUpdate`,
/// `ReplyUpdate`) that can be dropped if the consumer is slow. Use
/// `send_important()` for events that must be delivered (stage changes,
/// step updates, completion).
#[derive(Clone)]
pub struct EventSender {
    tx: TurnEventTx,
}

impl EventSender {
    /// Creates a new `EventSender` wrapping the given channel sender.
    pub fn new(tx: TurnEventTx) -> Self {
        Self { tx }
    }

    /// Best-effort send: never awaits, drops if channel is full.
    /// Safe for accumulated snapshots since a later snapshot supersedes it.
    pub fn send_snapshot(&self, ev: TurnEvent) {
        let _ = self.tx.try_send(Arc::new(ev));
    }

    /// Reliable send: awaits delivery.
    /// Use for stage transitions, step lifecycle, and completion.
    pub async fn send_important(&self, ev: TurnEvent) {
        let _ = self.tx.send(Arc::new(ev)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_ordering_matches_lifecycle() {
        assert!(Stage::Thinking < Stage::Speaking);
        assert!(Stage::Speaking < Stage::WorkflowRunning);
        assert!(Stage::WorkflowRunning < Stage::Completed);
        assert!(Stage::Completed.is_terminal());
        assert!(!Stage::Thinking.is_terminal());
    }

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::WorkflowRunning).unwrap();
        assert_eq!(json, "\"workflow_running\"");
    }

    #[test]
    fn event_tags_are_snake_case() {
        let ev = TurnEvent::ThinkingUpdate {
            text: "hm".to_string(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"thinking_update\""));
    }
}
