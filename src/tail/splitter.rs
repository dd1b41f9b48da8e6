// src/tail/splitter.rs

//! Incremental decode + line splitting.
//!
//! Bytes arrive in arbitrary chunks (one chunk per feed). The splitter keeps
//! everything needed to continue exactly where the previous chunk stopped:
//! - undecoded trailing bytes of a multi-byte character (inside the
//!   `encoding_rs` decoder),
//! - the text of the line that has not been terminated yet,
//! - the previous line terminator, so that a `\r\n` (or `\n\r`) pair split
//!   across two chunks still counts as a single line break.

use std::collections::VecDeque;
use std::fmt;

use encoding_rs::{CoderResult, Decoder, Encoding};

use crate::types::Line;

pub struct LineSplitter {
    encoding: &'static Encoding,
    decoder: Decoder,
    partial: String,
    last_terminator: Option<char>,
    next_line_number: u64,
}

impl fmt::Debug for LineSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSplitter")
            .field("encoding", &self.encoding.name())
            .field("partial_len", &self.partial.len())
            .field("last_terminator", &self.last_terminator)
            .field("next_line_number", &self.next_line_number)
            .finish()
    }
}

impl LineSplitter {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            decoder: encoding.new_decoder_with_bom_removal(),
            partial: String::new(),
            last_terminator: None,
            next_line_number: 0,
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Line number the next completed line will get.
    pub fn next_line_number(&self) -> u64 {
        self.next_line_number
    }

    /// Text of the line that is still waiting for its terminator.
    pub fn partial(&self) -> &str {
        &self.partial
    }

    /// Forget all carried state and restart numbering at 0.
    pub fn reset(&mut self) {
        self.decoder = self.encoding.new_decoder_with_bom_removal();
        self.partial.clear();
        self.last_terminator = None;
        self.next_line_number = 0;
    }

    /// Decode `bytes` and return the lines completed by them.
    ///
    /// At most `max_lines` lines are returned; when more lines complete, the
    /// oldest ones of this batch are dropped. Dropped lines still consume
    /// their line numbers.
    pub fn push(&mut self, bytes: &[u8], max_lines: usize) -> Vec<Line> {
        let decoded = self.decode(bytes);
        let mut lines = VecDeque::new();

        for c in decoded.chars() {
            match c {
                '\n' | '\r' => {
                    if self.last_terminator.is_some_and(|prev| prev != c) {
                        // Second half of a CR/LF pair: already terminated.
                        self.last_terminator = None;
                    } else {
                        self.last_terminator = Some(c);
                        self.complete_line(&mut lines, max_lines);
                    }
                }
                _ => {
                    self.partial.push(c);
                    self.last_terminator = None;
                }
            }
        }

        lines.into()
    }

    fn decode(&mut self, bytes: &[u8]) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len());
        let mut decoded = String::with_capacity(capacity);
        let mut src = bytes;

        loop {
            let (result, read, _had_replacements) =
                self.decoder.decode_to_string(src, &mut decoded, false);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => decoded.reserve(src.len() * 3 + 16),
            }
        }

        decoded
    }

    fn complete_line(&mut self, lines: &mut VecDeque<Line>, max_lines: usize) {
        let text = std::mem::take(&mut self.partial);
        lines.push_back(Line::new(self.next_line_number, text));
        self.next_line_number += 1;
        while lines.len() > max_lines {
            lines.pop_front();
        }
    }
}
