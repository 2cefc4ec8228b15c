//! Core types shared across the wire boundary

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One history entry as the agent service expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    /// Create a user history entry
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant history entry
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Which part of the conversation goes out with each request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Send every visible message; the service is stateless
    #[default]
    Full,
    /// Send only the new text; the service keeps context by session id
    Latest,
}

impl std::str::FromStr for HistoryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(HistoryMode::Full),
            "latest" | "single" => Ok(HistoryMode::Latest),
            other => Err(format!("unknown history mode: {}", other)),
        }
    }
}

/// Everything needed to open one outbound turn
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Conversation correlation token
    pub session_id: String,
    /// Visible history, ending with the new user entry
    pub history: Vec<WireMessage>,
    /// Text of the new user entry as the service should see it
    pub query: String,
}

impl TurnRequest {
    /// Render the JSON body for the given history mode
    pub fn body(&self, mode: HistoryMode) -> serde_json::Value {
        match mode {
            HistoryMode::Full => serde_json::json!({
                "session_id": self.session_id,
                "messages": self.history,
            }),
            HistoryMode::Latest => serde_json::json!({
                "session_id": self.session_id,
                "query": self.query,
            }),
        }
    }
}

/// Kind of structured choice the agent asks for mid-turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Confirm a booking before the agent executes it
    #[serde(alias = "confirm", alias = "approve")]
    Approval,
    SelectPlan,
    SelectFlight,
    SelectHotel,
    #[serde(other)]
    Other,
}

/// A mid-turn request for the user to pick among options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default)]
    pub options: Vec<serde_json::Value>,
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl Interaction {
    /// Create an interaction with options
    pub fn new(kind: InteractionKind, options: Vec<serde_json::Value>) -> Self {
        Self {
            kind,
            options,
            prompt: None,
        }
    }
}
