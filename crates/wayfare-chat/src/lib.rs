//! wayfare-chat: streaming chat session for the travel agent
//!
//! This crate owns the conversation transcript and folds the agent service's
//! frame stream into it: text deltas, tool invocations, interaction requests
//! and the turn lifecycle around them.

pub mod config;
pub mod error;
pub mod events;
pub mod interaction;
pub mod reducer;
pub mod session;
pub mod transcript;
pub mod transport;

pub use config::{ChatConfig, FINISH_MARKER, Locale, Notices};
pub use error::{Error, Result};
pub use events::{ChatEvent, TurnOutcome};
pub use interaction::{APPROVAL_VALUE, InteractionChoice, choices};
pub use session::ChatSession;
pub use transcript::{
    Message, MessageId, PendingInteraction, ToolInvocation, ToolStatus, Transcript,
    is_internal_tool,
};
pub use transport::{HttpTransport, Transport};
