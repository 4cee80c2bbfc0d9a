use crate::view_model::TranscriptView;
use crate::SourceDocument;

pub type SubmissionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }
}

/// Where the current submission is in its lifecycle.
///
/// Completion, failure and cancellation fall straight back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Streaming,
}

/// Bookkeeping for the submission in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    id: SubmissionId,
    question: String,
    /// Index of the optimistic user message; rollback truncates here.
    anchor: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptState {
    messages: Vec<Message>,
    sources: Vec<SourceDocument>,
    input: String,
    last_error: Option<String>,
    phase: Phase,
    in_flight: Option<InFlight>,
    last_submission: SubmissionId,
    degraded_lines: usize,
    dirty: bool,
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> TranscriptView {
        TranscriptView {
            messages: self.messages.clone(),
            sources: self.sources.clone(),
            input: self.input.clone(),
            pending: self.pending(),
            last_error: self.last_error.clone(),
            phase: self.phase,
            degraded_lines: self.degraded_lines,
            dirty: self.dirty,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn sources(&self) -> &[SourceDocument] {
        &self.sources
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True from submission start until the submission completes, fails or is cancelled.
    pub fn pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_submission(&self) -> Option<SubmissionId> {
        self.in_flight.as_ref().map(|flight| flight.id)
    }

    /// Lines dropped as malformed during the latest submission.
    pub fn degraded_lines(&self) -> usize {
        self.degraded_lines
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.dirty = true;
        }
    }

    pub(crate) fn is_current(&self, submission: SubmissionId) -> bool {
        self.current_submission() == Some(submission)
    }

    /// Applies the optimistic update for a new question and returns its id.
    pub(crate) fn begin_submission(&mut self) -> (SubmissionId, String) {
        let question = std::mem::take(&mut self.input);
        self.last_submission += 1;
        let id = self.last_submission;

        let anchor = self.messages.len();
        self.messages.push(Message::user(question.clone()));
        self.messages.push(Message::assistant(String::new()));
        self.sources.clear();
        self.last_error = None;
        self.degraded_lines = 0;
        self.phase = Phase::Submitting;
        self.in_flight = Some(InFlight {
            id,
            question: question.clone(),
            anchor,
        });
        self.dirty = true;
        (id, question)
    }

    pub(crate) fn mark_streaming(&mut self) {
        if self.phase != Phase::Streaming {
            self.phase = Phase::Streaming;
            self.dirty = true;
        }
    }

    pub(crate) fn append_token(&mut self, text: &str) {
        self.mark_streaming();
        if text.is_empty() {
            return;
        }
        if let Some(placeholder) = self.placeholder_mut() {
            placeholder.text.push_str(text);
            self.dirty = true;
        }
    }

    pub(crate) fn push_source(&mut self, document: SourceDocument) {
        self.mark_streaming();
        self.sources.push(document);
        self.dirty = true;
    }

    pub(crate) fn note_malformed_line(&mut self) {
        self.degraded_lines += 1;
        self.dirty = true;
    }

    /// Ends the submission, keeping whatever answer text already arrived.
    pub(crate) fn end_submission(&mut self) {
        self.in_flight = None;
        self.phase = Phase::Idle;
        self.dirty = true;
    }

    /// Removes the optimistic messages and gives the question back to the input.
    pub(crate) fn roll_back(&mut self, message: String) {
        if let Some(flight) = self.in_flight.take() {
            self.messages.truncate(flight.anchor);
            self.sources.clear();
            self.input = flight.question;
        }
        self.last_error = Some(message);
        self.phase = Phase::Idle;
        self.dirty = true;
    }

    fn placeholder_mut(&mut self) -> Option<&mut Message> {
        let anchor = self.in_flight.as_ref()?.anchor;
        self.messages
            .get_mut(anchor + 1)
            .filter(|message| message.sender == Sender::Assistant)
    }
}
