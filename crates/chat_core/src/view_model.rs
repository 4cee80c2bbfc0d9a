use crate::{Message, Phase, SourceDocument};

/// Read-only snapshot of the transcript for the render layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptView {
    pub messages: Vec<Message>,
    pub sources: Vec<SourceDocument>,
    pub input: String,
    pub pending: bool,
    pub last_error: Option<String>,
    pub phase: Phase,
    pub degraded_lines: usize,
    pub dirty: bool,
}

impl TranscriptView {
    /// The most recent assistant answer, if the transcript ends with one.
    pub fn latest_answer(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|message| message.sender == crate::Sender::Assistant)
            .map(|message| message.text.as_str())
    }
}
