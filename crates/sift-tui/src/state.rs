//! Application state composition.
//!
//! This module defines the top-level state for the TUI:
//! - `AppState` - all UI state (input, store, viewport, engine, turn)
//! - `TurnState` - turn execution state (idle or running with its receiver)

use sift_core::config::Config;
use sift_core::scenario;
use sift_core::turn::{ConversationStore, MessageId, TurnEngine, TurnEventRx};
use sift_core::viewport::ViewportCoordinator;

use crate::input::InputState;

/// Turn execution state.
///
/// Tracks the running turn and its event channel. The turn task sends
/// events through the channel, ending with `TurnCompleted`.
pub enum TurnState {
    /// No turn running, ready for input.
    Idle,
    /// A turn is streaming into the agent message `message_id`.
    Running {
        message_id: MessageId,
        /// Receiver for turn events, drained by the runtime each frame.
        rx: TurnEventRx,
    },
}

impl TurnState {
    pub fn is_running(&self) -> bool {
        !matches!(self, TurnState::Idle)
    }
}

/// TUI application state.
pub struct AppState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    /// User input state (buffer, history, navigation).
    pub input: InputState,
    /// Conversation messages and versioning.
    pub store: ConversationStore,
    /// Turn engine (active-turn slot, cancellation).
    pub engine: TurnEngine,
    /// Current turn state.
    pub turn_state: TurnState,
    /// Transcript scroll state.
    pub viewport: ViewportCoordinator,
    /// Application configuration.
    pub config: Config,
    /// Spinner animation frame counter (for running steps).
    pub spinner_frame: usize,
    /// Whether the conversation sidebar is visible.
    pub show_sidebar: bool,
    /// Titles of conversations reset away during this session.
    pub past_conversations: Vec<String>,
    /// Store version last seen by the frame handler, for growth detection.
    pub last_seen_version: u64,
    /// Transcript viewport height from the last frame (page-scroll size).
    pub transcript_height: u16,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = ConversationStore::with_welcome(scenario::WELCOME_TEXT);
        let viewport = ViewportCoordinator::from_config(&config.viewport);
        let last_seen_version = store.version();
        Self {
            should_quit: false,
            input: InputState::new(),
            store,
            engine: TurnEngine::new(),
            turn_state: TurnState::Idle,
            viewport,
            config,
            spinner_frame: 0,
            show_sidebar: true,
            past_conversations: Vec::new(),
            last_seen_version,
            transcript_height: 0,
        }
    }
}
