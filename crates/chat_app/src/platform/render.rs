use std::io::Write;

use chat_core::{Sender, SourceDocument, TranscriptState};
use chat_engine::{Completion, SessionError, TranscriptObserver};
use chat_logging::chat_warn;

const SOURCE_PREVIEW_CHARS: usize = 160;

/// Prints the growing answer as a "typing" stream.
///
/// Only the suffix of the assistant placeholder that was not printed yet is
/// written on each change; the placeholder only ever grows while pending.
pub(crate) struct TerminalRenderer<W: Write> {
    out: W,
    printed: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }

    /// Prints the closing lines for one submission.
    pub(crate) fn finish(
        &mut self,
        state: &TranscriptState,
        outcome: &Result<Completion, SessionError>,
    ) {
        let started = self.printed > 0;
        self.printed = 0;
        let result = match outcome {
            Ok(Completion::Completed) => self.print_completed(state, started),
            Ok(Completion::Cancelled) => writeln!(self.out, "\n[answer stopped]"),
            Ok(Completion::Rejected) => Ok(()),
            Err(_) => self.print_failure(state, started),
        };
        if let Err(err) = result.and_then(|_| self.out.flush()) {
            chat_warn!("Failed to write to terminal: {}", err);
        }
    }

    fn print_completed(&mut self, state: &TranscriptState, started: bool) -> std::io::Result<()> {
        if started {
            writeln!(self.out)?;
        }
        if !state.sources().is_empty() {
            writeln!(self.out, "sources:")?;
            for (index, source) in state.sources().iter().enumerate() {
                writeln!(self.out, "  [{}] {}", index + 1, describe_source(source))?;
            }
        }
        if state.degraded_lines() > 0 {
            writeln!(
                self.out,
                "(note: {} unreadable line(s) were skipped in this answer)",
                state.degraded_lines()
            )?;
        }
        Ok(())
    }

    fn print_failure(&mut self, state: &TranscriptState, started: bool) -> std::io::Result<()> {
        if started {
            writeln!(self.out)?;
        }
        let message = state.last_error().unwrap_or("the question could not be answered");
        writeln!(self.out, "error: {message}")?;
        if !state.input().is_empty() {
            writeln!(
                self.out,
                "your question was kept: {:?} (press Enter to send it again)",
                state.input()
            )?;
        }
        Ok(())
    }
}

impl<W: Write> TranscriptObserver for TerminalRenderer<W> {
    fn on_change(&mut self, state: &TranscriptState) {
        if !state.pending() {
            return;
        }
        let Some(answer) = state
            .messages()
            .last()
            .filter(|message| message.sender == Sender::Assistant)
        else {
            return;
        };
        let Some(fresh) = answer.text.get(self.printed..) else {
            return;
        };
        if fresh.is_empty() {
            return;
        }
        let written = write!(self.out, "{fresh}").and_then(|_| self.out.flush());
        if let Err(err) = written {
            chat_warn!("Failed to write to terminal: {}", err);
        }
        self.printed = answer.text.len();
    }
}

fn describe_source(source: &SourceDocument) -> String {
    let mut chars = source.content.split_whitespace().collect::<Vec<_>>().join(" ");
    if chars.chars().count() > SOURCE_PREVIEW_CHARS {
        chars = chars.chars().take(SOURCE_PREVIEW_CHARS).collect::<String>() + "…";
    }
    if source.metadata.is_empty() {
        return chars;
    }
    let metadata = source
        .metadata
        .iter()
        .map(|(key, value)| match value.as_str() {
            Some(text) => format!("{key}={text}"),
            None => format!("{key}={value}"),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{chars} ({metadata})")
}
