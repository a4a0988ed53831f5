//! Incremental `text/event-stream` decoder
//!
//! Bytes are fed as they arrive from the network; complete events are pulled
//! with [`SseDecoder::next_event`]. Lines may end in `\n`, `\r\n` or `\r`,
//! and a `\r\n` pair may be split across chunks.

use std::time::Duration;

use bytes::{Buf, BytesMut};

const BOM: &[u8] = b"\xEF\xBB\xBF";
const DEFAULT_EVENT_TYPE: &str = "message";

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type, `message` unless the stream set one
    pub event_type: String,
    /// Data lines joined with `\n`
    pub data: String,
    /// Last event id at dispatch time (empty if none was ever set)
    pub last_event_id: String,
}

/// Stateful event stream parser
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    data: String,
    event_type: String,
    /// Id seen since the last dispatch, committed when an event completes
    id_buffer: String,
    last_event_id: String,
    retry: Option<Duration>,
    bom_checked: bool,
    pending_cr: bool,
}

impl SseDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of bytes
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pull the next complete event, if the buffered bytes contain one
    pub fn next_event(&mut self) -> Option<SseEvent> {
        while let Some(line) = self.next_line() {
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        None
    }

    /// Id of the last completed event, kept across reconnects
    pub fn last_event_id(&self) -> Option<&str> {
        (!self.last_event_id.is_empty()).then_some(self.last_event_id.as_str())
    }

    /// Reconnection delay requested by the server
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Discard partial input before reading a new response body.
    ///
    /// Last event id and retry delay survive.
    pub fn reset_stream(&mut self) {
        self.buf.clear();
        self.data.clear();
        self.event_type.clear();
        self.id_buffer.clone_from(&self.last_event_id);
        self.bom_checked = false;
        self.pending_cr = false;
    }

    fn next_line(&mut self) -> Option<String> {
        if !self.bom_checked {
            if self.buf.len() < BOM.len() && BOM.starts_with(&self.buf) {
                return None;
            }
            if self.buf.starts_with(BOM) {
                self.buf.advance(BOM.len());
            }
            self.bom_checked = true;
        }

        if self.pending_cr {
            if self.buf.is_empty() {
                return None;
            }
            if self.buf[0] == b'\n' {
                self.buf.advance(1);
            }
            self.pending_cr = false;
        }

        let pos = self.buf.iter().position(|b| *b == b'\n' || *b == b'\r')?;
        let line = self.buf.split_to(pos);
        let terminator = self.buf[0];
        self.buf.advance(1);

        if terminator == b'\r' {
            match self.buf.first() {
                Some(b'\n') => self.buf.advance(1),
                Some(_) => {}
                None => self.pending_cr = true,
            }
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_type = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" if !value.contains('\0') => self.id_buffer = value.to_string(),
            "retry" if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        self.last_event_id.clone_from(&self.id_buffer);
        let event_type = std::mem::take(&mut self.event_type);
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        data.pop();

        Some(SseEvent {
            event_type: if event_type.is_empty() {
                DEFAULT_EVENT_TYPE.to_string()
            } else {
                event_type
            },
            data,
            last_event_id: self.last_event_id.clone(),
        })
    }
}
