//! UI event types.
//!
//! This module defines the unified event enum for the TUI.
//! All external inputs (terminal, turn events, spawned turns) are converted
//! to `UiEvent` before being processed by the reducer.

use crossterm::event::Event as CrosstermEvent;
use sift_core::turn::{MessageId, TurnEvent, TurnEventRx};

/// Unified event enum for the TUI.
///
/// All inputs to the TUI are converted to this type before processing.
/// The reducer (`update`) pattern-matches on these events to update state.
pub enum UiEvent {
    /// Timer tick (for animation, affordance expiry).
    Tick,

    /// Frame event for per-frame state updates (layout, scroll geometry).
    ///
    /// Emitted once per frame before other events are processed.
    /// Contains terminal dimensions for layout calculations.
    Frame { width: u16, height: u16 },

    /// Terminal input event (key, mouse, resize).
    Terminal(CrosstermEvent),

    /// Turn event (stage changes, content snapshots, completion).
    Turn(TurnEvent),

    /// A turn task was spawned; the reducer takes ownership of the receiver.
    TurnSpawned {
        message_id: MessageId,
        rx: TurnEventRx,
    },
}
