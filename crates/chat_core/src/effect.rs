use crate::SubmissionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the answer stream for an accepted question.
    OpenStream {
        submission: SubmissionId,
        question: String,
    },
}
