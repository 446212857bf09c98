//! Turn simulation: phase state machine, ticker, workflow tracker, store.

pub mod engine;
pub mod events;
pub mod store;
pub mod ticker;
pub mod workflow;

pub use engine::{TurnEngine, TurnError, TurnScript};
pub use events::{Stage, TurnEvent, TurnEventRx, TurnEventTx, create_event_channel};
pub use store::{ConversationStore, Message, MessageId, MessagePatch, Role, StoreError};
pub use workflow::{FinalReport, Step, StepKind, StepStatus};
