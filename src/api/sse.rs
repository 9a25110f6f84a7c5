//! Incremental server-sent-event framing.
//!
//! Network chunks carry no relation to frame boundaries, so [`SseParser`]
//! keeps whatever trails the last blank line and only decodes a frame once
//! its terminating `\n\n` has arrived. Bytes are buffered raw; a UTF-8
//! sequence split across two chunks is decoded only after both halves are in.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::mem;

const FRAME_DELIMITER: &[u8] = b"\n\n";

/// One `event:`/`data:` block of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    // Bytes already known not to start a delimiter.
    scanned: usize,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        // CR only ever appears as part of a line ending, never inside JSON text.
        self.buffer
            .extend(chunk.iter().copied().filter(|&b| b != b'\r'));

        let mut frames = Vec::new();
        while let Some(pos) = self.find_delimiter() {
            let segment: Vec<u8> = self.buffer.drain(..pos + FRAME_DELIMITER.len()).collect();
            self.scanned = 0;
            if let Some(frame) = parse_frame(&segment[..pos]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Parse whatever is left once the byte source is exhausted.
    pub fn finish(&mut self) -> Option<SseFrame> {
        self.scanned = 0;
        let rest = mem::take(&mut self.buffer);
        parse_frame(&rest)
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn find_delimiter(&mut self) -> Option<usize> {
        let start = self.scanned.saturating_sub(FRAME_DELIMITER.len() - 1);
        let found = self.buffer[start..]
            .windows(FRAME_DELIMITER.len())
            .position(|w| w == FRAME_DELIMITER)
            .map(|p| p + start);
        if found.is_none() {
            self.scanned = self.buffer.len();
        }
        found
    }
}

fn parse_frame(raw: &[u8]) -> Option<SseFrame> {
    let text = String::from_utf8_lossy(raw);
    let mut event = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(name) = line.strip_prefix("event:") {
            let name = name.trim();
            event = (!name.is_empty()).then(|| name.to_string());
        } else if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.trim());
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseFrame {
        event,
        data: data_lines.join("\n"),
    })
}

struct FrameStreamState<S> {
    source: S,
    parser: SseParser,
    pending: VecDeque<SseFrame>,
    ended: bool,
}

/// Lazily turn a byte stream into a stream of frames.
///
/// A transport error is yielded once and ends the stream.
pub fn frame_stream<S, E>(bytes: S) -> impl Stream<Item = Result<SseFrame, E>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    let state = FrameStreamState {
        source: bytes,
        parser: SseParser::new(),
        pending: VecDeque::new(),
        ended: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.pending.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.ended {
                return None;
            }

            match state.source.next().await {
                Some(Ok(chunk)) => {
                    state.pending.extend(state.parser.feed(&chunk));
                }
                Some(Err(e)) => {
                    state.ended = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.ended = true;
                    state.pending.extend(state.parser.finish());
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_partial_frame_until_delimiter() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"event: message\ndata: {\"del").is_empty());
        assert!(parser.pending_len() > 0);

        let frames = parser.feed(b"ta\":\"hi\"}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some("message".to_string()),
                data: "{\"delta\":\"hi\"}".to_string(),
            }]
        );
        assert_eq!(parser.pending_len(), 0);
    }

    #[test]
    fn drops_frames_without_data() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"event: open\n\n: keep-alive\n\ndata: {}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, None);
        assert_eq!(frames[0].data, "{}");
    }

    #[test]
    fn delimiter_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: 1\n").is_empty());
        let frames = parser.feed(b"\ndata: 2\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].data, "2");
    }

    #[test]
    fn crlf_line_endings() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"event: delta\r\ndata: {\"delta\":\"x\"}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("delta"));
    }

    #[test]
    fn joins_multiple_data_lines() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"data: first\ndata: second\n\n");
        assert_eq!(frames[0].data, "first\nsecond");
    }

    #[test]
    fn finish_parses_unterminated_tail() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: {\"done\":true}").is_empty());
        let tail = parser.finish().unwrap();
        assert_eq!(tail.data, "{\"done\":true}");
        assert!(parser.finish().is_none());
    }
}
