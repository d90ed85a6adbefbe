//! Incremental newline-delimited record parser
//!
//! Chunks arrive with no alignment to record boundaries. Bytes are buffered
//! until a newline completes a record, so a partial record (or a multi-byte
//! character split across chunks) is never interpreted early.

use super::wire;
use crate::conversation::{EventKind, StreamEvent};

/// Stateful parser turning raw transport chunks into stream events
#[derive(Debug, Default)]
pub struct EventParser {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline
    scanned: usize,
    /// Kind announced by the last `event:` line, applied to the next `data:`
    pending_kind: Option<EventKind>,
    dropped: usize,
}

impl EventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every event completed by it, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        loop {
            let Some(offset) = self
                .buffer
                .get(self.scanned..)
                .and_then(|rest| rest.iter().position(|byte| *byte == b'\n'))
            else {
                self.scanned = self.buffer.len();
                break;
            };
            let newline = self.scanned + offset;
            self.scanned = 0;

            let mut line = self.buffer.drain(..=newline).collect::<Vec<_>>();
            line.pop();
            if matches!(line.last(), Some(b'\r')) {
                line.pop();
            }
            if let Some(event) = self.parse_record(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Called on clean transport close. An unterminated trailing record is a
    /// partial record and is discarded.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            tracing::warn!(
                bytes = self.buffer.len(),
                "Discarding unterminated record at end of stream"
            );
            self.buffer.clear();
        }
        self.scanned = 0;
        self.pending_kind = None;
    }

    /// Number of malformed payloads dropped so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn parse_record(&mut self, raw: &[u8]) -> Option<StreamEvent> {
        let line = String::from_utf8_lossy(raw);

        if line.is_empty() {
            // Blank line ends an SSE event block
            self.pending_kind = None;
            return None;
        }
        if line.starts_with(':') {
            tracing::trace!("Keep-alive");
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };

        match field {
            "event" => {
                self.pending_kind = Some(EventKind::from_name(value));
                None
            }
            "data" => {
                let kind = self.pending_kind.take().unwrap_or_default();
                match wire::decode(value, kind) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        self.dropped += 1;
                        tracing::warn!(error = %e, payload = %value, "Dropping malformed stream record");
                        None
                    }
                }
            }
            _ => None,
        }
    }
}
