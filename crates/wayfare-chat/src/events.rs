//! Chat session event types

use serde::{Deserialize, Serialize};
use wayfare_wire::Interaction;

use crate::transcript::MessageId;

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The stream ended normally
    Completed,
    /// The user stopped the turn
    Cancelled,
    /// The agent is waiting for an answer to an interaction request
    AwaitingInteraction,
    /// The agent reported an error frame
    AgentError(String),
    /// The connection failed or the service refused the request
    TransportFailed(String),
}

impl TurnOutcome {
    /// Whether the turn ended abnormally
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TurnOutcome::AgentError(_) | TurnOutcome::TransportFailed(_)
        )
    }
}

/// Events emitted while a session runs turns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A user message and its assistant placeholder were appended
    TurnStarted {
        user_message_id: MessageId,
        assistant_message_id: MessageId,
    },

    /// The sub-agent producing the reply became known
    AgentIdentified { message_id: MessageId, agent: String },

    /// Text appended to the reply
    TextDelta { message_id: MessageId, delta: String },

    /// A tool started running
    ToolCallStarted { message_id: MessageId, name: String },

    /// Tool invocations moved to done
    ToolCallsResolved {
        message_id: MessageId,
        names: Vec<String>,
    },

    /// The agent asked the user to choose
    InteractionRequested {
        message_id: MessageId,
        interaction: Interaction,
    },

    /// The reply closed
    TurnEnded {
        message_id: MessageId,
        outcome: TurnOutcome,
    },

    /// The transcript was reset
    Cleared { session_id: String },
}

impl ChatEvent {
    /// Check if this is a terminal event for a turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::TurnEnded { .. } | ChatEvent::Cleared { .. })
    }
}
