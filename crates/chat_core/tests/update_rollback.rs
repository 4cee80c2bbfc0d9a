use chat_core::{
    update, Effect, Message, Msg, Phase, SourceDocument, StreamEvent, SubmissionId,
    TranscriptState,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    chat_logging::initialize_for_tests();
}

fn submit(state: TranscriptState, input: &str) -> (TranscriptState, SubmissionId) {
    let (state, _) = update(state, Msg::InputChanged(input.to_string()));
    let (state, effects) = update(state, Msg::QuestionSubmitted);
    let submission = match effects.as_slice() {
        [Effect::OpenStream { submission, .. }] => *submission,
        other => panic!("unexpected effects {other:?}"),
    };
    (state, submission)
}

/// A transcript with one completed exchange.
fn answered() -> TranscriptState {
    let (state, submission) = submit(TranscriptState::new(), "Define Y");
    let (state, _) = update(
        state,
        Msg::StreamEvent {
            submission,
            event: StreamEvent::token("Y is a term."),
        },
    );
    update(state, Msg::StreamCompleted { submission }).0
}

#[test]
fn error_event_removes_optimistic_messages_and_restores_input() {
    init_logging();
    let before = answered();
    let (state, submission) = submit(before.clone(), "What is X?");

    let (state, _) = update(
        state,
        Msg::StreamEvent {
            submission,
            event: StreamEvent::token("X is"),
        },
    );
    let (state, _) = update(
        state,
        Msg::StreamEvent {
            submission,
            event: StreamEvent::source(SourceDocument::new("evidence")),
        },
    );
    let (state, _) = update(
        state,
        Msg::StreamEvent {
            submission,
            event: StreamEvent::error("model overloaded"),
        },
    );

    let view = state.view();
    assert_eq!(view.messages, before.messages().to_vec());
    assert!(view
        .messages
        .iter()
        .all(|message| !message.text.contains("What is X?") && message.text != "X is"));
    assert_eq!(view.input, "What is X?");
    assert_eq!(view.last_error.as_deref(), Some("model overloaded"));
    assert!(view.sources.is_empty());
    assert!(!view.pending);
    assert_eq!(view.phase, Phase::Idle);
}

#[test]
fn transport_failure_rolls_back_like_an_error_event() {
    init_logging();
    let (state, submission) = submit(TranscriptState::new(), "What is X?");

    let (state, _) = update(
        state,
        Msg::StreamFailed {
            submission,
            message: "authentication required".to_string(),
        },
    );

    assert!(state.messages().is_empty());
    assert_eq!(state.input(), "What is X?");
    assert_eq!(state.last_error(), Some("authentication required"));
    assert!(!state.pending());
}

#[test]
fn user_can_resubmit_immediately_after_failure() {
    init_logging();
    let (state, submission) = submit(TranscriptState::new(), "What is X?");
    let (state, _) = update(
        state,
        Msg::StreamFailed {
            submission,
            message: "boom".to_string(),
        },
    );

    let (state, effects) = update(state, Msg::QuestionSubmitted);
    assert_eq!(
        effects,
        vec![Effect::OpenStream {
            submission: submission + 1,
            question: "What is X?".to_string(),
        }]
    );
    assert_eq!(state.last_error(), None);
    assert_eq!(
        state.messages(),
        &[Message::user("What is X?"), Message::assistant("")]
    );
}

#[test]
fn stale_failure_does_not_touch_newer_submission() {
    init_logging();
    let (state, first) = submit(TranscriptState::new(), "one");
    let (state, _) = update(state, Msg::StreamCompleted { submission: first });
    let (state, second) = submit(state, "two");

    let (state, _) = update(
        state,
        Msg::StreamFailed {
            submission: first,
            message: "late".to_string(),
        },
    );

    assert_eq!(state.current_submission(), Some(second));
    assert_eq!(state.last_error(), None);
    assert_eq!(state.messages().len(), 4);
}
