use crate::{StreamEvent, SubmissionId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the question input.
    InputChanged(String),
    /// User submitted the current input as a question.
    QuestionSubmitted,
    /// The transport accepted the request and the body is being read.
    StreamOpened { submission: SubmissionId },
    /// One decoded event from the answer stream.
    StreamEvent {
        submission: SubmissionId,
        event: StreamEvent,
    },
    /// A line that did not parse as an event was dropped.
    MalformedLine { submission: SubmissionId },
    /// The stream closed without an error event.
    StreamCompleted { submission: SubmissionId },
    /// The submission failed before or while streaming.
    StreamFailed {
        submission: SubmissionId,
        message: String,
    },
    /// Stream consumption stopped on request; partial text stays.
    StreamCancelled { submission: SubmissionId },
    /// Fallback for placeholder wiring.
    NoOp,
}
