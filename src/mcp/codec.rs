//! Newline-delimited JSON codec for the MCP stdio transport.
//!
//! A line that is not valid JSON does not end the stream; it is surfaced as
//! [`Frame::Malformed`] so the server can answer with a parse error.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

/// Default max frame length (16 MB).
pub const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// One decoded line.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Well-formed JSON value.
    Message(Value),
    /// Line that failed to parse, with the parser's complaint.
    Malformed(String),
}

/// Newline-delimited JSON codec.
#[derive(Debug, Clone)]
pub struct McpCodec {
    max_length: usize,
}

impl McpCodec {
    /// Create a codec with the default max length.
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LENGTH)
    }

    /// Create a codec with a custom max length.
    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }

    fn too_large(&self, length: usize) -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Message too large: {} > {}", length, self.max_length),
        )
    }
}

impl Default for McpCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_line(line: &[u8]) -> Frame {
    match serde_json::from_slice(line) {
        Ok(value) => Frame::Message(value),
        Err(e) => Frame::Malformed(e.to_string()),
    }
}

fn trim_line(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., last] = line {
        if last.is_ascii_whitespace() {
            line = rest;
        } else {
            break;
        }
    }
    while let [first, rest @ ..] = line {
        if first.is_ascii_whitespace() {
            line = rest;
        } else {
            break;
        }
    }
    line
}

impl Decoder for McpCodec {
    type Item = Frame;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(pos) = src.iter().position(|&b| b == b'\n') else {
                if src.len() > self.max_length {
                    return Err(self.too_large(src.len()));
                }
                return Ok(None);
            };

            if pos > self.max_length {
                return Err(self.too_large(pos));
            }

            let line = src.split_to(pos);
            src.advance(1);

            // Blank lines between messages are skipped
            let line = trim_line(&line);
            if line.is_empty() {
                continue;
            }
            return Ok(Some(parse_line(line)));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        // Final line without a trailing newline
        let rest = src.split();
        let line = trim_line(&rest);
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parse_line(line)))
        }
    }
}

impl<T: Serialize> Encoder<T> for McpCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        let json = serde_json::to_vec(&item)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("JSON error: {}", e)))?;

        if json.len() > self.max_length {
            return Err(self.too_large(json.len()));
        }

        dst.reserve(json.len() + 1);
        dst.put_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}
