//! Incremental decoder for the chat endpoint's `text/event-stream` body.
//!
//! Raw bytes are accumulated until a newline completes a line; a trailing
//! partial line is carried over to the next read. Only complete lines are
//! matched against the `data: ` prefix and decoded as a [`StreamEvent`].

use tracing::warn;

use crate::models::StreamEvent;
use crate::{Error, Result};

/// Prefix that marks a frame carrying an event payload.
pub const DATA_PREFIX: &str = "data: ";

/// Splits a byte stream into complete lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes, without terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Flush whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&rest).into_owned();
        Some(line.strip_suffix('\r').unwrap_or(&line).to_string())
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Outcome of decoding a single line.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(StreamEvent),
    /// Blank line, comment, or any line without the `data: ` prefix
    Ignored,
    /// `data: ` line whose payload is not a valid event
    Malformed(String),
}

/// Decode one complete line.
pub fn parse_line(line: &str) -> Frame {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Frame::Event(event),
        Err(e) => Frame::Malformed(e.to_string()),
    }
}

/// Line splitter plus frame decoding, with an optional bound on runs of
/// malformed frames.
#[derive(Debug, Default)]
pub struct SseDecoder {
    lines: LineDecoder,
    max_bad_frames: Option<usize>,
    bad_run: usize,
    skipped: usize,
}

impl SseDecoder {
    pub fn new(max_bad_frames: Option<usize>) -> Self {
        Self {
            max_bad_frames,
            ..Self::default()
        }
    }

    /// Feed a chunk and return the events it completes, in arrival order.
    ///
    /// Fails only when the malformed-frame bound is exceeded.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>> {
        let mut events = Vec::new();
        for line in self.lines.push(chunk) {
            if let Some(event) = self.decode(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Decode any unterminated final line.
    pub fn finish(&mut self) -> Result<Option<StreamEvent>> {
        match self.lines.finish() {
            Some(line) => self.decode(&line),
            None => Ok(None),
        }
    }

    /// Total malformed frames skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode(&mut self, line: &str) -> Result<Option<StreamEvent>> {
        match parse_line(line) {
            Frame::Event(event) => {
                self.bad_run = 0;
                Ok(Some(event))
            }
            Frame::Ignored => Ok(None),
            Frame::Malformed(reason) => {
                self.bad_run += 1;
                self.skipped += 1;
                warn!(reason = %reason, line = %line, "Skipping malformed stream frame");
                match self.max_bad_frames {
                    Some(max) if self.bad_run > max => Err(Error::Stream(format!(
                        "Received {} malformed frames in a row",
                        self.bad_run
                    ))),
                    _ => Ok(None),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_line_spans_reads() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: {\"type\":\"con").is_empty());
        assert_eq!(decoder.pending(), 18);

        let lines = decoder.push(b"tent\",\"text\":\"Hi\"}\n\ndata: ");
        assert_eq!(lines, vec![r#"data: {"type":"content","text":"Hi"}"#, ""]);
        assert_eq!(decoder.finish().as_deref(), Some("data: "));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_crlf_terminators() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"a\r\nb\r\n");
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_line_variants() {
        assert_eq!(
            parse_line(r#"data: {"type":"done"}"#),
            Frame::Event(StreamEvent::Done)
        );
        assert_eq!(parse_line(": keep-alive"), Frame::Ignored);
        assert_eq!(parse_line(""), Frame::Ignored);
        assert_eq!(parse_line(r#"data:{"type":"done"}"#), Frame::Ignored);
        assert!(matches!(parse_line("data: {not json"), Frame::Malformed(_)));
    }

    #[test]
    fn test_decoder_skips_malformed_frames() {
        let mut decoder = SseDecoder::new(None);
        let events = decoder
            .push(b"data: oops\n\ndata: {\"type\":\"content\",\"text\":\"ok\"}\n\n")
            .unwrap();
        assert_eq!(events, vec![StreamEvent::Content { text: "ok".to_string() }]);
        assert_eq!(decoder.skipped(), 1);
    }

    #[test]
    fn test_decoder_bad_frame_bound() {
        let mut decoder = SseDecoder::new(Some(2));
        assert!(decoder.push(b"data: x\ndata: y\n").unwrap().is_empty());
        // A good frame resets the run.
        assert_eq!(decoder.push(b"data: {\"type\":\"start\"}\n").unwrap(), vec![StreamEvent::Start]);
        assert!(decoder.push(b"data: x\ndata: y\n").unwrap().is_empty());
        assert!(matches!(decoder.push(b"data: z\n"), Err(Error::Stream(_))));
    }

    #[test]
    fn test_decoder_finish_decodes_trailing_frame() {
        let mut decoder = SseDecoder::new(None);
        assert!(decoder.push(b"data: {\"type\":\"done\"}").unwrap().is_empty());
        assert_eq!(decoder.finish().unwrap(), Some(StreamEvent::Done));
    }
}
