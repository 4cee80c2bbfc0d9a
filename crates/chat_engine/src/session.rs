use chat_core::{update, Effect, Msg, StreamEvent, SubmissionId, TranscriptState};
use chat_logging::{chat_debug, chat_info, chat_trace, chat_warn};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::event::{Dispatch, EventDispatcher};
use crate::lines::LineDecoder;
use crate::{
    CancelHandle, Completion, CredentialProvider, SessionError, StreamRequest, StreamTransport,
    TransportError, TransportFailure,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub base_url: String,
    pub material_id: u64,
}

impl SessionSettings {
    pub fn new(base_url: impl Into<String>, material_id: u64) -> Self {
        Self {
            base_url: base_url.into(),
            material_id,
        }
    }

    /// `{base_url}/api/materials/{material_id}/chat`, keeping any path prefix of the base.
    pub fn chat_url(&self) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)?.join(&format!("api/materials/{}/chat", self.material_id))
    }

    fn request(&self, question: &str, token: String) -> Result<StreamRequest, TransportError> {
        let url = self
            .chat_url()
            .map_err(|err| TransportError::new(TransportFailure::InvalidRequest, err.to_string()))?;
        Ok(StreamRequest {
            url: url.to_string(),
            bearer_token: token,
            body: json!({ "question": question }),
        })
    }
}

/// Render-layer hook, called after every transcript change.
pub trait TranscriptObserver {
    fn on_change(&mut self, state: &TranscriptState);
}

impl<F> TranscriptObserver for F
where
    F: FnMut(&TranscriptState),
{
    fn on_change(&mut self, state: &TranscriptState) {
        self(state)
    }
}

/// Drives one submission from request to the last line, reporting progress
/// as [`Msg`]s for the transcript reducer.
pub struct SessionController<T, C> {
    transport: T,
    credentials: C,
    settings: SessionSettings,
}

impl<T, C> SessionController<T, C>
where
    T: StreamTransport,
    C: CredentialProvider,
{
    pub fn new(transport: T, credentials: C, settings: SessionSettings) -> Self {
        Self {
            transport,
            credentials,
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Streams the answer to `question`.
    ///
    /// Every outcome is also reported through `sink`, so the transcript is
    /// consistent whatever this returns. An `Err` means the optimistic
    /// messages were rolled back.
    pub async fn run(
        &self,
        submission: SubmissionId,
        question: &str,
        cancel: &CancelHandle,
        sink: &mut dyn FnMut(Msg),
    ) -> Result<Completion, SessionError> {
        let Some(token) = self
            .credentials
            .current_token()
            .filter(|token| !token.trim().is_empty())
        else {
            return Err(fail(submission, SessionError::AuthRequired, sink));
        };
        let request = match self.settings.request(question, token) {
            Ok(request) => request,
            Err(err) => return Err(fail(submission, err.into(), sink)),
        };

        chat_info!(
            "Submission {} opening answer stream url={} question_len={}",
            submission,
            request.url,
            question.len()
        );
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = self.transport.open(request) => Some(opened),
        };
        let mut stream = match opened {
            None => return Ok(cancelled(submission, sink)),
            Some(Err(err)) => return Err(fail(submission, err.into(), sink)),
            Some(Ok(stream)) => stream,
        };
        sink(Msg::StreamOpened { submission });

        let mut decoder = LineDecoder::new();
        let mut dispatcher = EventDispatcher::new();
        let mut received = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = stream.next_chunk() => Some(next),
            };
            let chunk = match next {
                None => {
                    stream.cancel();
                    return Ok(cancelled(submission, sink));
                }
                Some(None) => break,
                Some(Some(Err(err))) => return Err(fail(submission, err.into(), sink)),
                Some(Some(Ok(chunk))) => chunk,
            };
            received += chunk.len();
            chat_trace!("Submission {} chunk len={}", submission, chunk.len());

            for line in decoder.push(&chunk) {
                match dispatcher.dispatch(&line) {
                    Dispatch::Skip => {}
                    Dispatch::Malformed => sink(Msg::MalformedLine { submission }),
                    Dispatch::Event(StreamEvent::Error { message }) => {
                        stream.cancel();
                        chat_warn!("Submission {} stream error: {}", submission, message);
                        sink(Msg::StreamEvent {
                            submission,
                            event: StreamEvent::Error {
                                message: message.clone(),
                            },
                        });
                        return Err(SessionError::Stream { message });
                    }
                    Dispatch::Event(event) => sink(Msg::StreamEvent { submission, event }),
                }
            }
        }

        if let Some(tail) = decoder.finish() {
            chat_warn!(
                "Submission {} dropped unterminated trailing line ({} bytes)",
                submission,
                tail.len()
            );
        }
        chat_info!(
            "Submission {} completed bytes={} malformed_lines={}",
            submission,
            received,
            dispatcher.malformed_count()
        );
        sink(Msg::StreamCompleted { submission });
        Ok(Completion::Completed)
    }
}

fn fail(submission: SubmissionId, error: SessionError, sink: &mut dyn FnMut(Msg)) -> SessionError {
    chat_warn!("Submission {} failed: {}", submission, error);
    sink(Msg::StreamFailed {
        submission,
        message: error.to_string(),
    });
    error
}

fn cancelled(submission: SubmissionId, sink: &mut dyn FnMut(Msg)) -> Completion {
    chat_info!("Submission {} cancelled", submission);
    sink(Msg::StreamCancelled { submission });
    Completion::Cancelled
}

/// One open conversation view: the transcript plus the controller feeding it.
///
/// Closing or dropping the session cancels every handle obtained from
/// [`ConversationSession::cancel_handle`].
pub struct ConversationSession<T, C> {
    controller: SessionController<T, C>,
    state: TranscriptState,
    view: CancellationToken,
}

impl<T, C> ConversationSession<T, C>
where
    T: StreamTransport,
    C: CredentialProvider,
{
    pub fn new(controller: SessionController<T, C>) -> Self {
        Self {
            controller,
            state: TranscriptState::new(),
            view: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &TranscriptState {
        &self.state
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.apply(Msg::InputChanged(text.into()));
    }

    /// Handle that stops the next (or current) submission. Also fires when the session closes.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::from(self.view.child_token())
    }

    pub fn close(&self) {
        self.view.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.view.is_cancelled()
    }

    /// Submits the current input and streams its answer into the transcript.
    pub async fn submit(
        &mut self,
        cancel: &CancelHandle,
        observer: &mut dyn TranscriptObserver,
    ) -> Result<Completion, SessionError> {
        if self.is_closed() {
            chat_debug!("Submission ignored: conversation closed");
            return Ok(Completion::Rejected);
        }
        let effects = self.apply(Msg::QuestionSubmitted);
        if self.state.consume_dirty() {
            observer.on_change(&self.state);
        }

        let mut outcome = Ok(Completion::Rejected);
        for effect in effects {
            match effect {
                Effect::OpenStream {
                    submission,
                    question,
                } => {
                    let Self {
                        controller, state, ..
                    } = self;
                    let mut sink = |msg: Msg| {
                        let (next, _) = update(std::mem::take(state), msg);
                        *state = next;
                        if state.consume_dirty() {
                            observer.on_change(state);
                        }
                    };
                    outcome = controller.run(submission, &question, cancel, &mut sink).await;
                }
            }
        }
        outcome
    }

    fn apply(&mut self, msg: Msg) -> Vec<Effect> {
        let (next, effects) = update(std::mem::take(&mut self.state), msg);
        self.state = next;
        effects
    }
}

impl<T, C> Drop for ConversationSession<T, C> {
    fn drop(&mut self) {
        self.view.cancel();
    }
}
