//! Streaming frame types and wire dialects
//!
//! Deployments of the agent service disagree on frame vocabulary. Each
//! [`Dialect`] maps its own labels into the closed [`AgentFrame`] type so the
//! reducer never sees wire-format churn.

use crate::{
    error::{Error, Result},
    frame::RawFrame,
    types::Interaction,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use tokio_stream::Stream;

/// Frames the reducer understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentFrame {
    /// Text to append to the reply
    TextDelta { delta: String },
    /// A tool started running on the agent side
    ToolCallStart {
        name: String,
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        arguments: Option<Value>,
    },
    /// A tool finished; the name may be missing on some deployments
    ToolCallResult {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        result: Option<Value>,
    },
    /// The agent needs the user to choose before it can go on
    InteractionRequest { interaction: Interaction },
    /// The turn is complete
    End,
    /// The agent reported a failure
    Error { message: String },
}

/// A decoded frame plus the sub-agent that emitted it, when the wire says so
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub frame: AgentFrame,
    pub agent: Option<String>,
}

/// A stream of raw text chunks from the agent service
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Frame vocabulary spoken by a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Accept both vocabularies
    #[default]
    Auto,
    /// `delta` / `tool_call` / `tool_result` / `interaction` / `end` / `error`
    Delta,
    /// `message` / `status` / `control` / `end` / `error`
    Message,
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Dialect::Auto),
            "delta" => Ok(Dialect::Delta),
            "message" => Ok(Dialect::Message),
            other => Err(format!("unknown dialect: {}", other)),
        }
    }
}

impl Dialect {
    /// Decode a raw frame.
    ///
    /// `Ok(None)` means the frame kind is not part of this dialect and should be
    /// ignored. `Err` means the frame was recognised but its payload is broken.
    pub fn decode(&self, raw: &RawFrame) -> Result<Option<DecodedFrame>> {
        let envelope = Envelope::from_raw(raw)?;
        let frame = match envelope.kind.as_str() {
            "end" | "done" | "finish" => Some(AgentFrame::End),
            "error" => Some(AgentFrame::Error {
                message: error_message(&envelope.payload),
            }),
            kind => match self {
                Dialect::Delta => decode_delta(kind, &envelope.payload)?,
                Dialect::Message => decode_message(kind, &envelope.payload)?,
                Dialect::Auto => match decode_delta(kind, &envelope.payload)? {
                    Some(frame) => Some(frame),
                    None => decode_message(kind, &envelope.payload)?,
                },
            },
        };

        Ok(frame.map(|frame| DecodedFrame {
            frame,
            agent: envelope.agent,
        }))
    }
}

/// Kind label, payload and optional agent label of one frame
struct Envelope {
    kind: String,
    payload: Value,
    agent: Option<String>,
}

impl Envelope {
    fn from_raw(raw: &RawFrame) -> Result<Self> {
        let data = raw.data.trim();
        if data == "[DONE]" {
            return Ok(Self {
                kind: "done".to_string(),
                payload: Value::Null,
                agent: None,
            });
        }

        let payload: Value = if data.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(data)?
        };

        // `data: {"event": ..., "data": ...}` wraps the real payload; servers that
        // emit it sometimes label the SSE event with the generic "message".
        let wrapped = matches!(raw.event.as_deref(), None | Some("message"))
            && payload.get("event").and_then(Value::as_str).is_some();
        if wrapped {
            let kind = payload["event"].as_str().unwrap_or_default().to_string();
            let agent = agent_label(&payload);
            let inner = payload.get("data").cloned().unwrap_or(Value::Null);
            return Ok(Self {
                kind,
                payload: inner,
                agent,
            });
        }

        match raw.event.as_deref() {
            Some(kind) => Ok(Self {
                kind: kind.to_string(),
                agent: agent_label(&payload),
                payload,
            }),
            None => Err(Error::decode("frame has neither an event label nor an envelope")),
        }
    }
}

fn agent_label(payload: &Value) -> Option<String> {
    payload
        .get("agent")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn decode_delta(kind: &str, payload: &Value) -> Result<Option<AgentFrame>> {
    Ok(match kind {
        "delta" => Some(AgentFrame::TextDelta {
            delta: text_payload(kind, payload)?,
        }),
        "tool_call" => Some(tool_call_start(payload)?),
        "tool_result" => Some(tool_call_result(payload)?),
        "interaction" | "interrupt" => Some(interaction_request(payload)?),
        _ => None,
    })
}

fn decode_message(kind: &str, payload: &Value) -> Result<Option<AgentFrame>> {
    Ok(match kind {
        "message" => Some(AgentFrame::TextDelta {
            delta: text_payload(kind, payload)?,
        }),
        "status" => status_frame(payload)?,
        "control" => Some(interaction_request(payload)?),
        _ => None,
    })
}

fn text_payload(kind: &str, payload: &Value) -> Result<String> {
    match payload {
        Value::String(s) => Ok(s.clone()),
        Value::Object(map) => map
            .get("content")
            .or_else(|| map.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::decode(format!("{} frame without text", kind))),
        other => Err(Error::decode(format!(
            "{} frame carries {} instead of text",
            kind,
            json_type(other)
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    name: String,
    #[serde(default, alias = "tool_call_id")]
    id: Option<String>,
    #[serde(default, alias = "arguments")]
    args: Option<Value>,
}

fn tool_call_start(payload: &Value) -> Result<AgentFrame> {
    let p: ToolCallPayload = serde_json::from_value(payload.clone())?;
    if p.name.is_empty() {
        return Err(Error::decode("tool_call frame with empty name"));
    }
    Ok(AgentFrame::ToolCallStart {
        name: p.name,
        id: p.id,
        arguments: p.args,
    })
}

#[derive(Debug, Default, Deserialize)]
struct ToolResultPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default, alias = "id")]
    tool_call_id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    update: Option<CommandUpdate>,
}

/// `update` section of a LangGraph `Command` object
#[derive(Debug, Default, Deserialize)]
struct CommandUpdate {
    #[serde(default)]
    messages: Vec<Value>,
}

fn tool_call_result(payload: &Value) -> Result<AgentFrame> {
    if !payload.is_object() {
        return Ok(AgentFrame::ToolCallResult {
            name: None,
            id: None,
            result: Some(payload.clone()).filter(|v| !v.is_null()),
        });
    }

    let p: ToolResultPayload = serde_json::from_value(payload.clone())?;
    let mut name = p.name.filter(|n| !n.is_empty());
    if name.is_none() && p.kind.as_deref() == Some("Command") {
        name = p.update.as_ref().and_then(command_tool_name);
    }

    Ok(AgentFrame::ToolCallResult {
        name,
        id: p.tool_call_id.filter(|id| !id.is_empty()),
        result: p.result,
    })
}

fn command_tool_name(update: &CommandUpdate) -> Option<String> {
    update
        .messages
        .iter()
        .find(|m| {
            m.get("type").and_then(Value::as_str) == Some("tool")
                || m.get("name").and_then(Value::as_str).is_some()
        })
        .and_then(|m| m.get("name").and_then(Value::as_str))
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn interaction_request(payload: &Value) -> Result<AgentFrame> {
    let interaction: Interaction = serde_json::from_value(payload.clone())?;
    Ok(AgentFrame::InteractionRequest { interaction })
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default, alias = "tool")]
    name: Option<String>,
    #[serde(alias = "status")]
    state: String,
    #[serde(default, alias = "tool_call_id")]
    id: Option<String>,
    #[serde(default, alias = "arguments")]
    args: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
}

fn status_frame(payload: &Value) -> Result<Option<AgentFrame>> {
    let p: StatusPayload = serde_json::from_value(payload.clone())?;
    let name = p.name.filter(|n| !n.is_empty());
    match p.state.as_str() {
        "start" | "calling" | "running" => {
            let name = name.ok_or_else(|| Error::decode("status start without tool name"))?;
            Ok(Some(AgentFrame::ToolCallStart {
                name,
                id: p.id,
                arguments: p.args,
            }))
        }
        "end" | "done" | "finished" => Ok(Some(AgentFrame::ToolCallResult {
            name,
            id: p.id,
            result: p.result,
        })),
        other => {
            tracing::debug!("Ignoring status frame with state {:?}", other);
            Ok(None)
        }
    }
}

fn error_message(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Null => "unknown error".to_string(),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .or_else(|| map.get("detail"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string()),
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InteractionKind;
    use serde_json::json;

    fn labelled(event: &str, data: &str) -> RawFrame {
        RawFrame {
            event: Some(event.to_string()),
            data: data.to_string(),
            id: None,
        }
    }

    fn bare(data: &str) -> RawFrame {
        RawFrame {
            event: None,
            data: data.to_string(),
            id: None,
        }
    }

    fn decode(dialect: Dialect, raw: RawFrame) -> Option<AgentFrame> {
        dialect.decode(&raw).unwrap().map(|d| d.frame)
    }

    #[test]
    fn test_envelope_delta_with_agent() {
        let raw = bare(r#"{"event":"delta","agent":"flight_agent","data":"Hello, "}"#);
        let decoded = Dialect::Delta.decode(&raw).unwrap().unwrap();
        assert_eq!(
            decoded.frame,
            AgentFrame::TextDelta {
                delta: "Hello, ".into()
            }
        );
        assert_eq!(decoded.agent.as_deref(), Some("flight_agent"));
    }

    #[test]
    fn test_labelled_delta_payload_is_json_string() {
        let frame = decode(Dialect::Delta, labelled("delta", "\"world\""));
        assert_eq!(
            frame,
            Some(AgentFrame::TextDelta {
                delta: "world".into()
            })
        );
    }

    #[test]
    fn test_labelled_delta_with_raw_text_is_decode_error() {
        let err = Dialect::Delta
            .decode(&labelled("delta", "world"))
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(decode(Dialect::Delta, bare("[DONE]")), Some(AgentFrame::End));
        assert_eq!(decode(Dialect::Message, labelled("end", "")), Some(AgentFrame::End));
    }

    #[test]
    fn test_tool_call_start() {
        let raw = bare(
            r#"{"event":"tool_call","data":{"name":"get_weather","args":{"city":"NYC"},"id":"c1"}}"#,
        );
        assert_eq!(
            decode(Dialect::Delta, raw),
            Some(AgentFrame::ToolCallStart {
                name: "get_weather".into(),
                id: Some("c1".into()),
                arguments: Some(json!({"city": "NYC"})),
            })
        );
    }

    #[test]
    fn test_tool_call_without_name_is_decode_error() {
        let raw = bare(r#"{"event":"tool_call","data":{"args":{}}}"#);
        assert!(Dialect::Delta.decode(&raw).is_err());
    }

    #[test]
    fn test_tool_result_named() {
        let raw = bare(
            r#"{"event":"tool_result","data":{"name":"book_hotel","result":"ok","tool_call_id":"c9"}}"#,
        );
        assert_eq!(
            decode(Dialect::Delta, raw),
            Some(AgentFrame::ToolCallResult {
                name: Some("book_hotel".into()),
                id: Some("c9".into()),
                result: Some(json!("ok")),
            })
        );
    }

    #[test]
    fn test_tool_result_command_envelope_yields_tool_name() {
        let payload = json!({
            "event": "tool_result",
            "data": {
                "type": "Command",
                "update": {"messages": [
                    {"type": "ai", "content": "routing"},
                    {"type": "tool", "name": "transfer_to_hotel_agent", "content": "ok"}
                ]}
            }
        });
        let frame = decode(Dialect::Delta, bare(&payload.to_string()));
        match frame {
            Some(AgentFrame::ToolCallResult { name, .. }) => {
                assert_eq!(name.as_deref(), Some("transfer_to_hotel_agent"));
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_tool_result_without_name() {
        let frame = decode(Dialect::Delta, labelled("tool_result", "\"42 hotels found\""));
        assert_eq!(
            frame,
            Some(AgentFrame::ToolCallResult {
                name: None,
                id: None,
                result: Some(json!("42 hotels found")),
            })
        );
    }

    #[test]
    fn test_interaction_request() {
        let raw = labelled(
            "interrupt",
            r#"{"type":"select_flight","options":[{"airline":"MU","flight_number":"MU5101","price":"¥1200"}]}"#,
        );
        match decode(Dialect::Delta, raw) {
            Some(AgentFrame::InteractionRequest { interaction }) => {
                assert_eq!(interaction.kind, InteractionKind::SelectFlight);
                assert_eq!(interaction.options.len(), 1);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_message_dialect_vocabulary() {
        assert_eq!(
            decode(Dialect::Message, labelled("message", r#"{"content":"Hi"}"#)),
            Some(AgentFrame::TextDelta { delta: "Hi".into() })
        );
        assert_eq!(
            decode(
                Dialect::Message,
                labelled("status", r#"{"tool":"query_hotels","state":"start"}"#)
            ),
            Some(AgentFrame::ToolCallStart {
                name: "query_hotels".into(),
                id: None,
                arguments: None,
            })
        );
        assert_eq!(
            decode(
                Dialect::Message,
                labelled("status", r#"{"tool":"query_hotels","state":"done"}"#)
            ),
            Some(AgentFrame::ToolCallResult {
                name: Some("query_hotels".into()),
                id: None,
                result: None,
            })
        );
        assert!(matches!(
            decode(
                Dialect::Message,
                labelled("control", r#"{"type":"select_plan","options":[]}"#)
            ),
            Some(AgentFrame::InteractionRequest { .. })
        ));
    }

    #[test]
    fn test_status_with_unknown_state_is_ignored() {
        assert_eq!(
            decode(
                Dialect::Message,
                labelled("status", r#"{"state":"thinking"}"#)
            ),
            None
        );
    }

    #[test]
    fn test_dialects_ignore_each_other() {
        assert_eq!(decode(Dialect::Delta, labelled("control", "{}")), None);
        assert_eq!(decode(Dialect::Message, labelled("delta", "\"x\"")), None);
        assert_eq!(
            decode(Dialect::Auto, labelled("message", "\"x\"")),
            Some(AgentFrame::TextDelta { delta: "x".into() })
        );
        assert_eq!(
            decode(Dialect::Auto, labelled("delta", "\"y\"")),
            Some(AgentFrame::TextDelta { delta: "y".into() })
        );
    }

    #[test]
    fn test_unknown_kind_is_ignored() {
        assert_eq!(decode(Dialect::Auto, labelled("heartbeat", "{}")), None);
        assert_eq!(
            decode(Dialect::Auto, bare(r#"{"event":"usage","data":{"tokens":3}}"#)),
            None
        );
    }

    #[test]
    fn test_error_payload_shapes() {
        assert_eq!(
            decode(Dialect::Auto, labelled("error", "\"quota exceeded\"")),
            Some(AgentFrame::Error {
                message: "quota exceeded".into()
            })
        );
        assert_eq!(
            decode(Dialect::Auto, labelled("error", r#"{"detail":"agent crashed"}"#)),
            Some(AgentFrame::Error {
                message: "agent crashed".into()
            })
        );
    }

    #[test]
    fn test_unlabelled_non_envelope_is_decode_error() {
        assert!(Dialect::Auto.decode(&bare(r#"{"text":"hi"}"#)).is_err());
        assert!(Dialect::Auto.decode(&bare("not json")).is_err());
    }
}
