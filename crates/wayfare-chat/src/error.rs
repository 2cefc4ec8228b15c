//! Error types for wayfare-chat

use thiserror::Error;

/// Result type alias using wayfare-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by chat session commands.
///
/// Transport and agent failures do not show up here: they end the turn and are
/// reported through [`crate::TurnOutcome`]. These are the synchronous
/// rejections, which leave the transcript untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// Nothing to send
    #[error("Message is empty")]
    EmptyMessage,

    /// A stream is already open for this session
    #[error("A reply is still streaming")]
    Busy,

    /// There is no interaction waiting for an answer
    #[error("No pending interaction")]
    NoPendingInteraction,

    /// The interaction was answered already
    #[error("Interaction already resolved")]
    InteractionAlreadyResolved,
}
