use encoding_rs::{CoderResult, Decoder, UTF_8};

/// Splits a UTF-8 byte stream into `\n`-terminated lines.
///
/// Chunk boundaries may fall anywhere, including inside a multi-byte
/// character: undecoded trailing bytes stay in the `encoding_rs` decoder and
/// unterminated text stays in `pending` until the next chunk arrives.
/// Invalid sequences decode to U+FFFD.
pub struct LineDecoder {
    decoder: Decoder,
    pending: String,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_without_bom_handling(),
            pending: String::new(),
        }
    }

    /// Feeds one chunk and returns every line it completed, newline stripped.
    /// Empty lines are returned as empty strings.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk, false);
        self.take_lines()
    }

    /// Flushes the decoder at end of stream and returns the unterminated
    /// remainder, which is never a line.
    pub fn finish(mut self) -> Option<String> {
        self.decode(&[], true);
        (!self.pending.is_empty()).then_some(self.pending)
    }

    fn decode(&mut self, mut src: &[u8], last: bool) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(src.len())
                .unwrap_or(src.len());
            self.pending.reserve(needed);
            let (result, read, _) = self.decoder.decode_to_string(src, &mut self.pending, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn take_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        complete[..last_newline]
            .split('\n')
            .map(str::to_owned)
            .collect()
    }
}
