//! Frame reassembly.
//!
//! The byte stream is cut at `\n` (an optional `\r` before it is dropped).
//! Only lines starting with the prefix marker carry frames; everything else
//! (`event:` lines, `:` comments, blank separators) is skipped. JSON never
//! contains a raw line break inside a string, so every `\n` ends a frame.
//!
//! The unterminated tail of each chunk is kept as raw bytes, so a chunk
//! boundary inside a multi-byte UTF-8 character is harmless.

use super::events::{DecodedFrame, Frame, FrameDecodeError};
use super::payloads::WirePayload;

pub const DEFAULT_FRAME_PREFIX: &str = "data:";
pub const DEFAULT_TERMINAL_TOKEN: &str = "[DONE]";

/// Stateful parser that turns arbitrarily split chunks into complete frames.
#[derive(Debug, Clone)]
pub struct FrameParser {
    /// Bytes after the last line break seen so far
    buffer: Vec<u8>,
    prefix: String,
    terminal_token: String,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self::with_markers(DEFAULT_FRAME_PREFIX, DEFAULT_TERMINAL_TOKEN)
    }

    pub fn with_markers(prefix: impl Into<String>, terminal_token: impl Into<String>) -> Self {
        Self {
            buffer: Vec::new(),
            prefix: prefix.into(),
            terminal_token: terminal_token.into(),
        }
    }

    /// Feed a chunk and return every frame it completes, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        // The buffered tail holds no line break, so only new bytes are searched
        let mut search_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            if let Some(frame) = self.parse_line(&self.buffer[start..end]) {
                frames.push(frame);
            }
            start = end + 1;
            search_from = start;
        }
        self.buffer.drain(..start);

        frames
    }

    /// Flush a final line that was not terminated by a line break.
    pub fn finish(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buffer);
        self.parse_line(&rest)
    }

    /// Drop buffered state so the parser can serve a new stream.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Bytes waiting for a line break
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn parse_line(&self, line: &[u8]) -> Option<Frame> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let line = String::from_utf8_lossy(line);
        let payload = line.strip_prefix(self.prefix.as_str())?;
        let payload = payload.strip_prefix(' ').unwrap_or(payload);

        if payload.is_empty() {
            return None;
        }
        if payload == self.terminal_token {
            return Some(Frame::Terminal);
        }
        Some(Frame::Data(payload.to_string()))
    }
}

/// JSON-decode one frame. The terminal marker passes through untouched.
pub fn decode_frame(frame: Frame) -> Result<DecodedFrame, FrameDecodeError> {
    match frame {
        Frame::Terminal => Ok(DecodedFrame::Terminal),
        Frame::Data(payload) => serde_json::from_str::<WirePayload>(&payload)
            .map(DecodedFrame::Payload)
            .map_err(|err| FrameDecodeError::new(&payload, &err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(s: &str) -> Frame {
        Frame::Data(s.to_string())
    }

    #[test]
    fn test_single_complete_frame() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b"data: {\"content\":\"hi\"}\n");
        assert_eq!(frames, vec![data(r#"{"content":"hi"}"#)]);
        assert_eq!(parser.pending_len(), 0);
    }

    #[test]
    fn test_frame_split_mid_field() {
        let mut parser = FrameParser::new();
        assert!(parser.push(b"data: {\"con").is_empty());
        let frames = parser.push(b"tent\":\"hi\"}\n");
        assert_eq!(frames, vec![data(r#"{"content":"hi"}"#)]);
    }

    #[test]
    fn test_prefix_split_across_chunks() {
        let mut parser = FrameParser::new();
        assert!(parser.push(b"da").is_empty());
        assert!(parser.push(b"ta:").is_empty());
        assert_eq!(parser.push(b"{}\n"), vec![data("{}")]);
    }

    #[test]
    fn test_multibyte_char_split() {
        let bytes = "data: {\"content\":\"안녕\"}\n".as_bytes();
        // Split inside the first Hangul syllable (3 bytes in UTF-8)
        let split = bytes.iter().position(|b| *b >= 0x80).unwrap() + 1;

        let mut parser = FrameParser::new();
        assert!(parser.push(&bytes[..split]).is_empty());
        let frames = parser.push(&bytes[split..]);

        assert_eq!(frames, vec![data(r#"{"content":"안녕"}"#)]);
    }

    #[test]
    fn test_crlf_and_non_data_lines() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b": keepalive\r\nevent: message\r\ndata: {\"a\":1}\r\n\r\n");
        assert_eq!(frames, vec![data(r#"{"a":1}"#)]);
    }

    #[test]
    fn test_terminal_token() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b"data: {}\ndata: [DONE]\n");
        assert_eq!(frames, vec![data("{}"), Frame::Terminal]);
    }

    #[test]
    fn test_custom_markers() {
        let mut parser = FrameParser::with_markers(">>", "<eof>");
        let frames = parser.push(b">>{\"x\":1}\ndata: ignored\n>> <eof>\n");
        assert_eq!(frames, vec![data(r#"{"x":1}"#), Frame::Terminal]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut parser = FrameParser::new();
        assert!(parser.push(b"data: [DONE]").is_empty());
        assert_eq!(parser.finish(), Some(Frame::Terminal));
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_reset_discards_partial_line() {
        let mut parser = FrameParser::new();
        parser.push(b"data: {\"content\":");
        parser.reset();
        assert_eq!(parser.pending_len(), 0);
        assert_eq!(parser.push(b"data: {}\n"), vec![data("{}")]);
    }

    #[test]
    fn test_empty_data_line_ignored() {
        let mut parser = FrameParser::new();
        assert!(parser.push(b"data:\ndata: \r\n").is_empty());
    }

    #[test]
    fn test_only_one_space_after_prefix_is_stripped() {
        let mut parser = FrameParser::new();
        let frames = parser.push(b"data:  {}\ndata: [DONE]   \ndata:[DONE]\n");
        assert_eq!(
            frames,
            vec![data(" {}"), data("[DONE]   "), Frame::Terminal]
        );
    }

    #[test]
    fn test_long_frame_in_small_chunks() {
        let text = "x".repeat(10_000);
        let line = format!("data: {{\"content\":\"{}\"}}\n", text);

        let mut parser = FrameParser::new();
        let mut frames = Vec::new();
        for chunk in line.as_bytes().chunks(3) {
            frames.extend(parser.push(chunk));
        }

        assert_eq!(frames, vec![data(&line[6..line.len() - 1])]);
        assert_eq!(parser.pending_len(), 0);
    }

    #[test]
    fn test_decode_frame() {
        let decoded = decode_frame(data(r#"{"content":"hi"}"#)).unwrap();
        match decoded {
            DecodedFrame::Payload(payload) => assert_eq!(payload.content.as_deref(), Some("hi")),
            DecodedFrame::Terminal => panic!("Expected payload"),
        }
        assert_eq!(decode_frame(Frame::Terminal).unwrap(), DecodedFrame::Terminal);
    }

    #[test]
    fn test_decode_frame_malformed() {
        let err = decode_frame(data("{not json")).unwrap_err();
        assert_eq!(err.snippet, "{not json");
    }
}
