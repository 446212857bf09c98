//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent turn lifecycle operations only (no direct UI mutations).
//!
//! This keeps the reducer pure: it only mutates state and returns effects,
//! never spawns tasks directly.

/// Effects returned by the reducer for the runtime to execute.
///
/// The reducer returns `Vec<UiEffect>` from each update call.
/// The runtime executes these effects after rendering.
#[derive(Debug, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Start a turn for the given prompt.
    StartTurn { prompt: String },

    /// Cancel the running turn. The turn task stops at its next scheduled
    /// resumption; the reducer has already torn down its receiver.
    CancelTurn,
}
