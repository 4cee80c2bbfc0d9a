//! Study chat core: pure transcript state machine and view-model helpers.
mod effect;
mod event;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use event::{Metadata, SourceDocument, StreamEvent};
pub use msg::Msg;
pub use state::{Message, Phase, Sender, SubmissionId, TranscriptState};
pub use update::update;
pub use view_model::TranscriptView;
