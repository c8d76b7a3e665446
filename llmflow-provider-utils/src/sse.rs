//! Server-sent-events line framing over a raw byte stream.
//!
//! Grounded on `ai-sdk-openai-compatible/src/chat/chat_language_model.rs`'s
//! `process_stream` method, which buffers incoming bytes, splits on `\n`,
//! strips the `data: ` prefix, and recognizes the `[DONE]` sentinel inline
//! with its OpenAI-specific chunk parsing. That buffering/splitting logic
//! is extracted here as a provider-agnostic `SseEvent` stream so every
//! adapter crate (not just one) gets it for free instead of reimplementing
//! the same buffer-and-split loop.

use bytes::Bytes;
use futures::Stream;
use futures_util::StreamExt;

/// One decoded SSE event. Only the `data` field is surfaced: none of the
/// adapters in this workspace need `event:`/`id:`/`retry:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data: ...` line's payload, with the `[DONE]` sentinel already
    /// filtered out by [`sse_events`].
    Data(String),
}

/// Framing error: the byte stream itself failed, or yielded non-UTF-8
/// bytes mid-line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SseError {
    #[error("SSE byte stream error: {0}")]
    Transport(String),
    #[error("SSE stream contained invalid UTF-8")]
    InvalidUtf8,
}

/// Wraps a byte stream (as returned by an HTTP client's streaming body)
/// into a stream of decoded [`SseEvent`]s.
///
/// Lines are buffered until a `\n` is seen; empty lines and non-`data:`
/// lines are skipped; a payload of `[DONE]` ends the stream early, the way
/// OpenAI-compatible APIs signal completion.
pub fn sse_events<E>(
    byte_stream: impl Stream<Item = Result<Bytes, E>> + Send + 'static,
) -> impl Stream<Item = Result<SseEvent, SseError>> + Send
where
    E: std::fmt::Display + Send + 'static,
{
    async_stream::stream! {
        let mut buffer = String::new();
        let mut stream = Box::pin(byte_stream);

        'outer: while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield Err(SseError::Transport(e.to_string()));
                    break;
                }
            };

            let text = match std::str::from_utf8(&bytes) {
                Ok(t) => t,
                Err(_) => {
                    yield Err(SseError::InvalidUtf8);
                    break;
                }
            };
            buffer.push_str(text);

            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..=pos);

                if line.is_empty() {
                    continue;
                }

                if let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) {
                    let data = data.trim();
                    if data == "[DONE]" {
                        break 'outer;
                    }
                    yield Ok(SseEvent::Data(data.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, stream};

    #[tokio::test]
    async fn splits_lines_across_chunk_boundaries() {
        let chunks: Vec<Result<Bytes, std::convert::Infallible>> = vec![
            Ok(Bytes::from_static(b"data: {\"a\":")),
            Ok(Bytes::from_static(b"1}\n\n")),
            Ok(Bytes::from_static(b"data: [DONE]\n")),
        ];
        let events: Vec<_> = sse_events(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &SseEvent::Data("{\"a\":1}".to_string()));
    }

    #[tokio::test]
    async fn skips_blank_lines_and_non_data_fields() {
        let chunks: Vec<Result<Bytes, std::convert::Infallible>> =
            vec![Ok(Bytes::from_static(b"event: ping\n\ndata: hello\n\n"))];
        let events: Vec<_> = sse_events(stream::iter(chunks)).collect().await;
        assert_eq!(events, vec![Ok(SseEvent::Data("hello".to_string()))]);
    }
}
