use crate::{Effect, Msg, StreamEvent, TranscriptState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages tagged with a submission other than the one in flight are stale
/// and leave the state untouched.
pub fn update(mut state: TranscriptState, msg: Msg) -> (TranscriptState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::QuestionSubmitted => {
            if state.pending() || state.input().trim().is_empty() {
                return (state, Vec::new());
            }
            let (submission, question) = state.begin_submission();
            vec![Effect::OpenStream {
                submission,
                question,
            }]
        }
        Msg::StreamOpened { submission } => {
            if state.is_current(submission) {
                state.mark_streaming();
            }
            Vec::new()
        }
        Msg::StreamEvent { submission, event } => {
            if state.is_current(submission) {
                apply_event(&mut state, event);
            }
            Vec::new()
        }
        Msg::MalformedLine { submission } => {
            if state.is_current(submission) {
                state.note_malformed_line();
            }
            Vec::new()
        }
        Msg::StreamCompleted { submission } | Msg::StreamCancelled { submission } => {
            if state.is_current(submission) {
                state.end_submission();
            }
            Vec::new()
        }
        Msg::StreamFailed {
            submission,
            message,
        } => {
            if state.is_current(submission) {
                state.roll_back(message);
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_event(state: &mut TranscriptState, event: StreamEvent) {
    match event {
        StreamEvent::Token { text } => state.append_token(&text),
        StreamEvent::Source { document } => state.push_source(document),
        StreamEvent::Error { message } => state.roll_back(message),
    }
}
