//! Incremental `text/event-stream` decoding.
//!
//! Only `data:` fields matter to the backend; `event:`, `id:` and `retry:`
//! are accepted and dropped, comment lines are skipped.

use crate::RemoteError;

/// Largest event, including its unterminated tail, that is buffered.
pub const MAX_EVENT_BYTES: usize = 4 << 20;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
    data_len: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of the body and collect the data payload of every
    /// event it completes. Chunks may split lines, or UTF-8 sequences, anywhere.
    /// An event growing past `MAX_EVENT_BYTES` is discarded with an error.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, RemoteError> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(event) = self.line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        if self.buffer.len() + self.data_len > MAX_EVENT_BYTES {
            self.buffer.clear();
            self.data.clear();
            self.data_len = 0;
            return Err(RemoteError::Parse(format!(
                "event exceeds {} bytes",
                MAX_EVENT_BYTES
            )));
        }
        Ok(events)
    }

    /// End of body: an event still missing its blank line is delivered anyway.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest);
            self.line(rest.trim_end_matches('\r'));
        }
        self.dispatch()
    }

    fn line(&mut self, line: &str) -> Option<String> {
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
        if field == "data" {
            self.data_len += value.len() + 1;
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        self.data_len = 0;
        Some(payload)
    }
}
