//! Append-only conversation store.
//!
//! Messages are only ever appended; the single exception is patching the
//! agent message that a running turn owns. Every mutation bumps a version
//! counter and notifies subscribers, which lets the TUI coalesce redraws
//! instead of tracking individual field changes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::turn::events::Stage;
use crate::turn::workflow::{FinalReport, Step};

/// Stable identifier for a message. Never reused across turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

/// One conversation entry.
///
/// User messages only carry `text` and are completed on arrival. Agent
/// messages accumulate fields as the owning turn advances through stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub stage: Stage,
    pub text: String,
    pub thinking: String,
    pub steps: Vec<Step>,
    pub final_report: Option<FinalReport>,
    /// Welcome messages render with the quick-action list.
    pub welcome: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            stage: Stage::Completed,
            text: text.into(),
            thinking: String::new(),
            steps: Vec::new(),
            final_report: None,
            welcome: false,
            created_at: Utc::now(),
        }
    }

    pub fn welcome(text: impl Into<String>) -> Self {
        Self {
            welcome: true,
            ..Self::agent_placeholder(MessageId::new())
        }
        .with_completed_text(text)
    }

    /// Empty agent message in the `thinking` stage, owned by a new turn.
    pub fn agent_placeholder(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Agent,
            stage: Stage::Thinking,
            text: String::new(),
            thinking: String::new(),
            steps: Vec::new(),
            final_report: None,
            welcome: false,
            created_at: Utc::now(),
        }
    }

    fn with_completed_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self.stage = Stage::Completed;
        self
    }

    pub fn is_active(&self) -> bool {
        self.role == Role::Agent && !self.stage.is_terminal()
    }
}

/// Partial update for the active agent message.
///
/// `None` fields are left untouched; `Some` fields replace the current value
/// wholesale. Callers therefore pass accumulated snapshots, not deltas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub stage: Option<Stage>,
    pub thinking: Option<String>,
    pub text: Option<String>,
    pub steps: Option<Vec<Step>>,
    pub final_report: Option<FinalReport>,
}

/// Errors from store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Patch target is missing, is a user message, or already completed.
    InvalidTarget(MessageId),
    /// A placeholder was appended with an id already in the conversation.
    DuplicateId(MessageId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidTarget(id) => write!(f, "message {id} is not patchable"),
            StoreError::DuplicateId(id) => write!(f, "message id {id} already exists"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Append-only message list with version tracking and change notification.
pub struct ConversationStore {
    messages: Vec<Message>,
    version: u64,
    subscribers: Vec<mpsc::UnboundedSender<u64>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            version: 0,
            subscribers: Vec::new(),
        }
    }

    /// Creates a store seeded with the welcome message.
    pub fn with_welcome(text: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.push(Message::welcome(text));
        store
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True until the first user message arrives. The welcome quick actions
    /// are only offered while this holds.
    pub fn is_pristine(&self) -> bool {
        self.messages.iter().all(|m| m.role != Role::User)
    }

    /// Subscribes to version bumps. Each mutation sends the new version.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<u64> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn append_user(&mut self, text: impl Into<String>) -> MessageId {
        let message = Message::user(text);
        let id = message.id;
        self.push(message);
        id
    }

    /// Appends the placeholder agent message a new turn will patch.
    pub fn append_agent_placeholder(&mut self, id: MessageId) -> Result<(), StoreError> {
        if self.messages.iter().any(|m| m.id == id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.push(Message::agent_placeholder(id));
        Ok(())
    }

    /// Applies a partial update to the agent message `id`.
    ///
    /// Only an active agent message may be patched; completed messages are
    /// immutable. The stage never moves backward: a regressing stage in the
    /// patch is ignored while the other fields still apply.
    pub fn patch_agent(&mut self, id: MessageId, patch: MessagePatch) -> Result<u64, StoreError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::InvalidTarget(id))?;
        if !message.is_active() {
            return Err(StoreError::InvalidTarget(id));
        }

        if let Some(stage) = patch.stage
            && stage >= message.stage
        {
            message.stage = stage;
        }
        if let Some(thinking) = patch.thinking {
            message.thinking = thinking;
        }
        if let Some(text) = patch.text {
            message.text = text;
        }
        if let Some(steps) = patch.steps {
            message.steps = steps;
        }
        if let Some(report) = patch.final_report {
            message.final_report = Some(report);
        }

        self.bump();
        Ok(self.version)
    }

    /// Drops everything and reseeds the welcome message.
    pub fn reset(&mut self, welcome_text: impl Into<String>) {
        self.messages.clear();
        self.push(Message::welcome(welcome_text));
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.bump();
    }

    fn bump(&mut self) {
        self.version += 1;
        let version = self.version;
        self.subscribers.retain(|tx| tx.send(version).is_ok());
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
