//! Frame-to-transcript reducer
//!
//! Pure functions over the assistant message a turn is writing into. The
//! session decides which message that is and what to do with the returned
//! [`Flow`]; nothing here touches the network.

use wayfare_wire::{AgentFrame, DecodedFrame, Interaction};

use crate::{
    config::{FINISH_MARKER, Notices},
    transcript::{Message, PendingInteraction, ToolInvocation},
};

/// What the stream loop should do after a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading frames
    Continue,
    /// The turn completed normally
    Finish,
    /// The agent is waiting for the user; stop reading
    Suspend,
    /// The agent reported an error; stop reading
    Failed(String),
}

/// Observable effect of one frame on the message
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    None,
    Text(String),
    ToolStarted(String),
    ToolsResolved(Vec<String>),
    Interaction(Interaction),
    AgentError(String),
}

/// Result of applying one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub flow: Flow,
    pub change: Change,
}

impl Step {
    fn go(change: Change) -> Self {
        Self {
            flow: Flow::Continue,
            change,
        }
    }
}

/// Apply a decoded frame to the in-progress assistant message
pub fn apply(message: &mut Message, decoded: DecodedFrame, notices: &Notices) -> Step {
    if message.agent.is_none() {
        message.agent = decoded.agent;
    }

    match decoded.frame {
        AgentFrame::TextDelta { delta } => {
            if delta.is_empty() {
                return Step::go(Change::None);
            }
            message.content.push_str(&delta);
            Step::go(Change::Text(delta))
        }
        AgentFrame::ToolCallStart {
            name,
            id,
            arguments,
        } => {
            if let Some(last) = message.tool_calls.last_mut() {
                if last.name == name && last.is_calling() {
                    if last.id.is_none() {
                        last.id = id;
                    }
                    if last.arguments.is_none() {
                        last.arguments = arguments;
                    }
                    return Step::go(Change::None);
                }
            }
            message.tool_calls.push(ToolInvocation {
                id,
                arguments,
                ..ToolInvocation::calling(name.clone())
            });
            Step::go(Change::ToolStarted(name))
        }
        AgentFrame::ToolCallResult { name, id, result } => {
            let resolved = resolve_tool(message, name.as_deref(), id.as_deref(), result);
            if resolved.is_empty() {
                Step::go(Change::None)
            } else {
                Step::go(Change::ToolsResolved(resolved))
            }
        }
        AgentFrame::InteractionRequest { interaction } => {
            message.pending_interaction = Some(PendingInteraction::new(interaction.clone()));
            Step {
                flow: Flow::Suspend,
                change: Change::Interaction(interaction),
            }
        }
        AgentFrame::End => Step {
            flow: Flow::Finish,
            change: Change::None,
        },
        AgentFrame::Error { message: error } => {
            let marker = notices.agent_error_marker(&error);
            if !message.content.is_empty() && !message.content.ends_with('\n') {
                message.content.push('\n');
            }
            message.content.push_str(&marker);
            message.error = Some(error.clone());
            Step {
                flow: Flow::Failed(error.clone()),
                change: Change::AgentError(error),
            }
        }
    }
}

/// Mark the first matching `calling` tool done.
///
/// Matching goes by tool-call id, then by the oldest calling entry with that
/// name. When neither finds anything (or the frame had no name) every calling
/// entry is resolved: that attribution is a heuristic, not a guarantee.
fn resolve_tool(
    message: &mut Message,
    name: Option<&str>,
    id: Option<&str>,
    result: Option<serde_json::Value>,
) -> Vec<String> {
    let by_id = id.and_then(|id| {
        message
            .tool_calls
            .iter()
            .position(|t| t.is_calling() && t.id.as_deref() == Some(id))
    });
    let matched = by_id.or_else(|| {
        name.and_then(|name| {
            message
                .tool_calls
                .iter()
                .position(|t| t.is_calling() && t.name == name)
        })
    });

    if let Some(index) = matched {
        let tool = &mut message.tool_calls[index];
        tool.finish();
        tool.result = result;
        return vec![tool.name.clone()];
    }

    let calling = message.calling_tools().count();
    if calling == 0 {
        tracing::debug!("Tool result {:?} arrived with no tool running", name);
        return Vec::new();
    }

    tracing::warn!(
        "Tool result {:?} matched no running tool, resolving all {} running tools",
        name,
        calling
    );
    finish_all(message)
}

fn finish_all(message: &mut Message) -> Vec<String> {
    message
        .tool_calls
        .iter_mut()
        .filter_map(|t| t.finish().then(|| t.name.clone()))
        .collect()
}

/// Close the turn: stop streaming, settle running tools, drop a trailing
/// `FINISH` sentinel. Safe to call more than once.
pub fn close(message: &mut Message, strip_finish_marker: bool) -> Vec<String> {
    message.is_streaming = false;
    let resolved = finish_all(message);

    if strip_finish_marker {
        if let Some(kept) = message.content.strip_suffix(FINISH_MARKER).map(str::len) {
            message.content.truncate(kept);
        }
    }
    resolved
}

/// Record a transport failure on the message
pub fn fail(message: &mut Message, error: &str, notices: &Notices) {
    message.error = Some(error.to_string());
    if message.content.trim().is_empty() {
        message.content = notices.connection_failed.clone();
    }
}
