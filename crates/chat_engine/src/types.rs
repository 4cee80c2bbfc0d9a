use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The stream closed normally and the answer was kept.
    Completed,
    /// The caller stopped the stream; partial text was kept.
    Cancelled,
    /// Nothing was sent: blank input, a submission already pending, or a closed view.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportFailure,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    InvalidRequest,
    Connect,
    Timeout,
    HttpStatus(u16),
    MissingBody,
    Body,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::InvalidRequest => write!(f, "invalid request"),
            TransportFailure::Connect => write!(f, "connection failed"),
            TransportFailure::Timeout => write!(f, "timeout"),
            TransportFailure::HttpStatus(code) => write!(f, "http status {code}"),
            TransportFailure::MissingBody => write!(f, "response has no body"),
            TransportFailure::Body => write!(f, "response body interrupted"),
        }
    }
}

/// Failures reported for one submission. Each one has already been applied
/// to the transcript as a rollback when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("authentication required")]
    AuthRequired,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{message}")]
    Stream { message: String },
}
