//! Study chat engine: answer-stream transport, line framing, event parsing
//! and the session controller that feeds the transcript reducer.
mod credentials;
mod event;
mod lines;
mod session;
mod transport;
mod types;

pub use credentials::{CredentialProvider, StaticCredentials};
pub use event::{parse_event, Dispatch, EventDispatcher, MalformedEvent, DEFAULT_STREAM_ERROR};
pub use lines::LineDecoder;
pub use session::{ConversationSession, SessionController, SessionSettings, TranscriptObserver};
pub use transport::{
    CancelHandle, ChunkResult, ChunkStream, ReqwestTransport, StreamRequest, StreamTransport,
    TransportSettings,
};
pub use types::{Completion, SessionError, TransportError, TransportFailure};
