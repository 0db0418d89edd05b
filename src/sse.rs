//! Server-Sent Events (SSE) stream framing.
//!
//! Dify streams application output as `text/event-stream`: every frame is a
//! single line starting with `data: ` followed by a JSON document, and frames
//! are separated by blank lines.
//!
//! ```text
//! data: {"event": "message", "answer": "Hi"}
//!
//! data: {"event": "message_end"}
//! ```
//!
//! This module turns a raw byte stream into a stream of the `data: ` payload
//! strings. Blank separator lines, comment lines, and any other line without
//! the prefix are discarded without error.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::client::DifyError;

/// The line prefix carrying an event frame.
pub const DATA_PREFIX: &str = "data: ";

/// Convert a byte stream into a stream of SSE data payloads.
///
/// The input is buffered and cut strictly at newlines; a line (or a UTF-8
/// sequence) split across network chunks is reassembled before parsing. An
/// unterminated trailing line is flushed when the input ends.
///
/// Transport errors from the underlying stream are yielded in place.
pub fn data_lines<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, DifyError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<DifyError> + Send + 'static,
{
    stream::unfold(
        (Box::pin(byte_stream), Vec::new(), false),
        |(mut byte_stream, mut buffer, mut stream_ended)| async move {
            loop {
                // If the input hasn't ended, try to read more data
                if !stream_ended {
                    match byte_stream.next().await {
                        Some(Ok(chunk)) => {
                            buffer.extend_from_slice(&chunk);
                        }
                        Some(Err(e)) => {
                            return Some((Err(e.into()), (byte_stream, buffer, stream_ended)));
                        }
                        None => {
                            // Input ended; flush any buffered lines below
                            stream_ended = true;
                        }
                    }
                }

                // Process complete lines from the buffer
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line_bytes: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line_bytes);
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if let Some(data) = parse_sse_line(line) {
                        return Some((Ok(data.to_string()), (byte_stream, buffer, stream_ended)));
                    }
                }

                // Input ended with an unterminated final line
                if stream_ended {
                    if !buffer.is_empty() {
                        let line = String::from_utf8_lossy(&buffer).trim().to_string();
                        buffer.clear();
                        if let Some(data) = parse_sse_line(&line) {
                            return Some((
                                Ok(data.to_string()),
                                (byte_stream, buffer, stream_ended),
                            ));
                        }
                    }

                    return None;
                }

                // No complete lines yet, continue reading
            }
        },
    )
}

/// Parse an SSE line to extract the data portion.
///
/// SSE lines are in the format: `data: <content>`. Lines without the prefix
/// (blank separators, `: comments`, other fields) yield `None`.
///
/// # Example
/// ```
/// use dify_client::sse::parse_sse_line;
///
/// let line = "data: {\"key\": \"value\"}";
/// assert_eq!(parse_sse_line(line), Some("{\"key\": \"value\"}"));
///
/// let line = ": keep-alive";
/// assert_eq!(parse_sse_line(line), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX).map(|s| s.trim())
}
