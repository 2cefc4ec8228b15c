//! Transcript model: messages, tool invocations and pending interactions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wayfare_wire::{Interaction, Role, WireMessage};

use crate::interaction::InteractionChoice;

/// Opaque, stable identifier of a transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh id for a message of the given role
    pub fn generate(role: Role) -> Self {
        Self(format!("{}-{}", role.as_str(), uuid::Uuid::new_v4()))
    }

    /// The id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Calling,
    Done,
}

/// One capability call made on behalf of the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ToolInvocation {
    /// A freshly started invocation
    pub fn calling(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            status: ToolStatus::Calling,
            arguments: None,
            result: None,
        }
    }

    /// Whether the invocation is still running
    pub fn is_calling(&self) -> bool {
        self.status == ToolStatus::Calling
    }

    /// Move calling -> done. Returns false if it was already done.
    pub fn finish(&mut self) -> bool {
        if self.is_calling() {
            self.status = ToolStatus::Done;
            true
        } else {
            false
        }
    }

    /// Whether this is internal routing between sub-agents
    pub fn is_internal(&self) -> bool {
        is_internal_tool(&self.name)
    }
}

/// Tools named `transfer_*` route between sub-agents and are never shown
pub fn is_internal_tool(name: &str) -> bool {
    name.starts_with("transfer_")
}

/// An interaction request attached to an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInteraction {
    pub interaction: Interaction,
    /// Set once the user has answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<InteractionChoice>,
}

impl PendingInteraction {
    /// Wrap an unanswered interaction
    pub fn new(interaction: Interaction) -> Self {
        Self {
            interaction,
            resolution: None,
        }
    }

    /// Whether the user has answered already
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tool_calls: Vec<ToolInvocation>,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_interaction: Option<PendingInteraction>,
    /// Sub-agent that produced the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Failure recorded when the turn ended abnormally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false)
    }

    /// Create an empty assistant placeholder that is streaming
    pub fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, String::new(), true)
    }

    fn new(role: Role, content: String, is_streaming: bool) -> Self {
        Self {
            id: MessageId::generate(role),
            role,
            content,
            timestamp: Utc::now(),
            tool_calls: Vec::new(),
            is_streaming,
            pending_interaction: None,
            agent: None,
            error: None,
        }
    }

    /// Whether this is an assistant message
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Tool invocations that are still running
    pub fn calling_tools(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.tool_calls.iter().filter(|t| t.is_calling())
    }

    /// Tool invocations worth showing to the user
    pub fn visible_tools(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.tool_calls.iter().filter(|t| !t.is_internal())
    }

    /// The unanswered interaction, if any
    pub fn open_interaction(&self) -> Option<&PendingInteraction> {
        self.pending_interaction
            .as_ref()
            .filter(|p| !p.is_resolved())
    }

    /// Whether an assistant message has nothing to show
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
            && self.visible_tools().next().is_none()
            && self.pending_interaction.is_none()
            && !self.is_streaming
    }

    /// History entry for the agent service
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Ordered list of conversation turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id
    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// All messages in conversation order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Look up a message by id
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().rev().find(|m| &m.id == id)
    }

    /// Mutable lookup by id
    pub fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().rev().find(|m| &m.id == id)
    }

    /// Most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Most recent message if it is an assistant message
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.last().filter(|m| m.is_assistant())
    }

    /// Mutable access to the most recent message if it is an assistant message
    pub fn last_assistant_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut().filter(|m| m.is_assistant())
    }

    /// Most recent assistant message that carried an interaction, answered or not
    pub fn latest_interaction_mut(&mut self) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .rev()
            .find(|m| m.is_assistant() && m.pending_interaction.is_some())
    }

    /// Discard every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// History for the agent service, skipping assistant replies with nothing in them
    pub fn to_wire(&self) -> Vec<WireMessage> {
        self.messages
            .iter()
            .filter(|m| !(m.is_assistant() && m.content.trim().is_empty()))
            .map(Message::to_wire)
            .collect()
    }
}
