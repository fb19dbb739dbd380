//! Incremental completion stream
//!
//! The streaming endpoint emits `data:` lines, each carrying a JSON delta,
//! and finishes with a `[DONE]` sentinel. [`CompletionStream`] turns the
//! raw byte stream into a lazy, finite sequence of text deltas: it ends at
//! the sentinel or when the connection closes, and any failure surfaces as
//! a single terminal error after which the stream yields nothing.

use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::pin::Pin;
use std::task::{Context, Poll};

use super::client::{classify_transport, ApiError};

const DONE_SENTINEL: &str = "[DONE]";

/// One parsed streaming payload.
#[derive(Debug, Deserialize)]
struct ChunkBody {
    delta: Option<String>,
}

/// What a single wire line decodes to.
#[derive(Debug, PartialEq)]
enum LineEvent {
    /// A text fragment to append to the response.
    Delta(String),
    /// The end-of-stream sentinel.
    Done,
    /// Blank line, comment, or a chunk with nothing to show.
    Skip,
}

fn decode_line(line: &str) -> Result<LineEvent, ApiError> {
    let line = line.trim();

    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(LineEvent::Skip);
    };
    let payload = payload.trim();

    if payload == DONE_SENTINEL {
        return Ok(LineEvent::Done);
    }

    let chunk: ChunkBody = serde_json::from_str(payload)
        .map_err(|e| ApiError::Decode(format!("bad stream chunk: {}", e)))?;

    Ok(match chunk.delta {
        Some(text) if !text.is_empty() => LineEvent::Delta(text),
        _ => LineEvent::Skip,
    })
}

struct StreamState<B> {
    body: B,
    buf: String,
    done: bool,
}

/// Lazy, finite, non-restartable sequence of response text deltas.
pub struct CompletionStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, ApiError>> + Send>>,
}

impl CompletionStream {
    pub fn new(response: reqwest::Response) -> Self {
        let state = StreamState {
            body: response.bytes_stream(),
            buf: String::new(),
            done: false,
        };

        let inner = stream::unfold(state, |mut st| async move {
            if st.done {
                return None;
            }

            loop {
                // Drain complete lines already buffered.
                if let Some(pos) = st.buf.find('\n') {
                    let line: String = st.buf.drain(..=pos).collect();
                    match decode_line(&line) {
                        Ok(LineEvent::Skip) => continue,
                        Ok(LineEvent::Done) => {
                            st.done = true;
                            return None;
                        }
                        Ok(LineEvent::Delta(text)) => return Some((Ok(text), st)),
                        Err(e) => {
                            st.done = true;
                            return Some((Err(e), st));
                        }
                    }
                }

                match st.body.next().await {
                    Some(Ok(bytes)) => st.buf.push_str(&String::from_utf8_lossy(&bytes)),
                    Some(Err(e)) => {
                        st.done = true;
                        return Some((Err(classify_transport(e)), st));
                    }
                    None => {
                        // Connection closed; a trailing partial line still counts.
                        st.done = true;
                        if st.buf.trim().is_empty() {
                            return None;
                        }
                        let line = std::mem::take(&mut st.buf);
                        return match decode_line(&line) {
                            Ok(LineEvent::Delta(text)) => Some((Ok(text), st)),
                            Ok(_) => None,
                            Err(e) => Some((Err(e), st)),
                        };
                    }
                }
            }
        });

        Self {
            inner: Box::pin(inner),
        }
    }
}

impl Stream for CompletionStream {
    type Item = Result<String, ApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_delta_lines() {
        let event = decode_line(r#"data: {"delta":"Hello"}"#).unwrap();
        assert_eq!(event, LineEvent::Delta("Hello".to_string()));
    }

    #[test]
    fn decodes_done_sentinel() {
        assert_eq!(decode_line("data: [DONE]").unwrap(), LineEvent::Done);
    }

    #[test]
    fn skips_blank_and_non_data_lines() {
        assert_eq!(decode_line("").unwrap(), LineEvent::Skip);
        assert_eq!(decode_line(": keep-alive").unwrap(), LineEvent::Skip);
        assert_eq!(decode_line("event: ping").unwrap(), LineEvent::Skip);
    }

    #[test]
    fn skips_chunks_without_text() {
        assert_eq!(decode_line(r#"data: {"delta":""}"#).unwrap(), LineEvent::Skip);
        assert_eq!(decode_line(r#"data: {}"#).unwrap(), LineEvent::Skip);
    }

    #[test]
    fn malformed_chunk_is_an_error() {
        let err = decode_line("data: {not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
