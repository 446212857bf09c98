//! Turn engine: owns the single active turn and drives its phases.
//!
//! A turn walks thinking, speaking, workflow, completion on a timed schedule,
//! emitting events the whole way. At most one turn runs at a time; starting
//! another while one is active is an error, not a queue.

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::config::TimingConfig;
use crate::turn::events::{EventSender, Stage, TurnEvent, TurnEventRx, create_event_channel};
use crate::turn::store::MessageId;
use crate::turn::ticker;
use crate::turn::workflow::{self, FinalReport, Step};

/// Errors from starting a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// A turn is already running; finish or cancel it first.
    AlreadyActive { active: MessageId },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::AlreadyActive { active } => {
                write!(f, "a turn is already active (message {active})")
            }
        }
    }
}

impl std::error::Error for TurnError {}

/// Everything a simulated turn will say and do, decided up front.
#[derive(Debug, Clone)]
pub struct TurnScript {
    pub thinking: String,
    pub reply: String,
    pub steps: Vec<Step>,
    pub report: FinalReport,
}

struct ActiveTurn {
    message_id: MessageId,
    cancel: CancellationToken,
}

/// Tracks the active turn and hands out event receivers.
///
/// The engine itself is synchronous state; the turn body runs on a spawned
/// task and communicates only through the event channel.
pub struct TurnEngine {
    active: Option<ActiveTurn>,
}

impl TurnEngine {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Starts a turn, returning the agent message id it owns and the event
    /// receiver to drain.
    ///
    /// # Errors
    /// Returns `TurnError::AlreadyActive` if a turn is still running.
    pub fn start_turn(
        &mut self,
        script: TurnScript,
        timing: TimingConfig,
    ) -> Result<(MessageId, TurnEventRx), TurnError> {
        if let Some(active) = &self.active {
            return Err(TurnError::AlreadyActive {
                active: active.message_id,
            });
        }

        let message_id = MessageId::new();
        let cancel = CancellationToken::new();
        let (tx, rx) = create_event_channel();
        let sender = EventSender::new(tx);

        tokio::spawn(run_turn(script, timing, cancel.clone(), sender));

        tracing::debug!(%message_id, "turn started");
        self.active = Some(ActiveTurn { message_id, cancel });
        Ok((message_id, rx))
    }

    /// True while a turn is running and `id` is the message it owns.
    pub fn is_active(&self, id: MessageId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.message_id == id && !a.cancel.is_cancelled())
    }

    pub fn has_active_turn(&self) -> bool {
        self.active.is_some()
    }

    /// Clears the active slot after `TurnCompleted` is observed.
    pub fn finish(&mut self, id: MessageId) {
        if self.active.as_ref().is_some_and(|a| a.message_id == id) {
            self.active = None;
        }
    }

    /// Cancels the active turn, if any. The turn task stops at its next
    /// scheduled resumption and emits nothing further.
    pub fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!(message_id = %active.message_id, "turn cancelled");
            active.cancel.cancel();
        }
    }
}

impl Default for TurnEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// The turn body. Every await point sits behind the cancellation token, so a
/// cancelled turn goes silent instead of finishing its phase.
async fn run_turn(
    script: TurnScript,
    timing: TimingConfig,
    cancel: CancellationToken,
    sender: EventSender,
) {
    sender.send_important(TurnEvent::TurnStarted).await;

    // Phase 1: thinking.
    let done = ticker::stream_text(&script.thinking, timing.thinking_cadence(), &cancel, |s| {
        sender.send_snapshot(TurnEvent::ThinkingUpdate {
            text: s.to_string(),
        });
    })
    .await;
    if !done {
        return;
    }
    // Snapshot sends are lossy; deliver the final accumulation reliably.
    sender
        .send_important(TurnEvent::ThinkingUpdate {
            text: script.thinking.clone(),
        })
        .await;
    if !ticker::delay(timing.thinking_settle(), &cancel).await {
        return;
    }

    // Phase 2: speaking.
    sender
        .send_important(TurnEvent::StageChanged {
            stage: Stage::Speaking,
        })
        .await;
    let done = ticker::stream_text(&script.reply, timing.reply_cadence(), &cancel, |s| {
        sender.send_snapshot(TurnEvent::ReplyUpdate {
            text: s.to_string(),
        });
    })
    .await;
    if !done {
        return;
    }
    sender
        .send_important(TurnEvent::ReplyUpdate {
            text: script.reply.clone(),
        })
        .await;
    if !ticker::delay(timing.reply_settle(), &cancel).await {
        return;
    }

    // Phase 3: workflow.
    sender
        .send_important(TurnEvent::StageChanged {
            stage: Stage::WorkflowRunning,
        })
        .await;
    // Step snapshots are few and every status change matters; send reliably.
    let step_sender = sender.clone();
    let finished = workflow::run_steps(script.steps, &cancel, move |steps| {
        let sender = step_sender.clone();
        async move {
            sender.send_important(TurnEvent::StepsUpdate { steps }).await;
        }
    })
    .await;
    if finished.is_none() {
        return;
    }

    // Phase 4: completion.
    sender
        .send_important(TurnEvent::ReportReady {
            report: script.report.clone(),
        })
        .await;
    sender
        .send_important(TurnEvent::StageChanged {
            stage: Stage::Completed,
        })
        .await;
    sender.send_important(TurnEvent::TurnCompleted).await;
}
