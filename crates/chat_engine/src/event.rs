use chat_core::{SourceDocument, StreamEvent};
use chat_logging::chat_warn;
use serde_json::Value;

/// Message used when an `error` event carries no payload.
pub const DEFAULT_STREAM_ERROR: &str = "the answer stream reported an error";

const LINE_PREVIEW_CHARS: usize = 120;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MalformedEvent {
    #[error("line is not valid json: {0}")]
    InvalidJson(String),
    #[error("event has no type field")]
    MissingType,
    #[error("unknown event type {0:?}")]
    UnknownType(String),
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },
}

/// Parses one complete line of the answer stream.
///
/// Wire shape: `{"type": "token" | "source" | "error", "data": ...}`.
pub fn parse_event(line: &str) -> Result<StreamEvent, MalformedEvent> {
    let value: Value =
        serde_json::from_str(line).map_err(|err| MalformedEvent::InvalidJson(err.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(MalformedEvent::MissingType);
    };
    let kind = match object.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(MalformedEvent::MissingType),
    };
    let data = object.remove("data").unwrap_or(Value::Null);

    match kind.as_str() {
        "token" => token_text(data).map(|text| StreamEvent::Token { text }),
        "source" => serde_json::from_value::<SourceDocument>(data)
            .map(|document| StreamEvent::Source { document })
            .map_err(|err| MalformedEvent::InvalidPayload {
                kind: "source",
                reason: err.to_string(),
            }),
        "error" => Ok(StreamEvent::Error {
            message: error_message(data),
        }),
        _ => Err(MalformedEvent::UnknownType(kind)),
    }
}

fn token_text(data: Value) -> Result<String, MalformedEvent> {
    match data {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(MalformedEvent::InvalidPayload {
            kind: "token",
            reason: format!("expected text, got {other}"),
        }),
    }
}

fn error_message(data: Value) -> String {
    match data {
        Value::String(message) if !message.trim().is_empty() => message,
        Value::String(_) | Value::Null => DEFAULT_STREAM_ERROR.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Whitespace-only line.
    Skip,
    Event(StreamEvent),
    /// The line was dropped; details went to the log.
    Malformed,
}

/// Routes decoded lines to events, dropping what does not parse.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    malformed: usize,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, line: &str) -> Dispatch {
        if line.trim().is_empty() {
            return Dispatch::Skip;
        }
        match parse_event(line) {
            Ok(event) => Dispatch::Event(event),
            Err(err) => {
                self.malformed += 1;
                chat_warn!(
                    "Dropping malformed stream line ({}): {}",
                    err,
                    preview(line)
                );
                Dispatch::Malformed
            }
        }
    }

    pub fn malformed_count(&self) -> usize {
        self.malformed
    }
}

fn preview(line: &str) -> String {
    let mut chars = line.chars();
    let head: String = chars.by_ref().take(LINE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
