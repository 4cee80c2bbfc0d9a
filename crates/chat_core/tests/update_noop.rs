use chat_core::{update, Msg, TranscriptState};

#[test]
fn update_is_noop() {
    let state = TranscriptState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn stream_messages_without_submission_are_noops() {
    let state = TranscriptState::new();
    let (next, effects) = update(state.clone(), Msg::StreamCompleted { submission: 1 });

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
