//! Server-Sent Events (SSE) processing for streaming chat completions.
//!
//! This module converts the raw byte stream of an HTTP response into a stream
//! of [`ChatCompletionChunk`]s. Events are delimited by a blank line; the
//! `data: [DONE]` sentinel ends the stream.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;

use crate::observability::{STREAM_BYTES, STREAM_CHUNKS};
use crate::{ChatCompletionChunk, Error, Result};

/// Process a stream of bytes into a stream of chat completion chunks.
///
/// Bytes are buffered until a complete event is available, so multi-byte
/// characters and events split across network reads decode correctly.
/// Transport errors are forwarded as [`Error::Streaming`].
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, Vec::new(), 0, false),
        move |(mut stream, mut buffer, mut scanned, done)| async move {
            if done {
                return None;
            }
            loop {
                // First check if we have a complete event in the buffer
                if let Some(event) = take_event(&mut buffer, &mut scanned) {
                    match parse_event(&event) {
                        Some(SseEvent::Chunk(chunk)) => {
                            STREAM_CHUNKS.click();
                            return Some((chunk, (stream, buffer, scanned, false)));
                        }
                        Some(SseEvent::Done) => return None,
                        None => continue,
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, buffer, scanned, true)));
                    }
                    None => {
                        // A final event may lack its trailing blank line.
                        let rest = std::mem::take(&mut buffer);
                        return match parse_event(&rest) {
                            Some(SseEvent::Chunk(chunk)) => {
                                Some((chunk, (stream, buffer, scanned, true)))
                            }
                            Some(SseEvent::Done) | None => None,
                        };
                    }
                }
            }
        },
    )
}

enum SseEvent {
    Chunk(Result<ChatCompletionChunk>),
    Done,
}

fn error_message(error: &Value) -> String {
    error
        .as_str()
        .or_else(|| error.get("message").and_then(|m| m.as_str()))
        .unwrap_or("server reported an error mid-stream")
        .to_string()
}

/// Removes the first complete event from `buffer`, if there is one.
///
/// `scanned` is how far earlier calls searched without finding a delimiter;
/// the next search starts just before it.
fn take_event(buffer: &mut Vec<u8>, scanned: &mut usize) -> Option<Vec<u8>> {
    let Some((end, delimiter)) = find_delimiter(buffer, scanned.saturating_sub(3)) else {
        *scanned = buffer.len();
        return None;
    };
    let event = buffer[..end].to_vec();
    buffer.drain(..end + delimiter);
    *scanned = 0;
    Some(event)
}

fn find_delimiter(buffer: &[u8], from: usize) -> Option<(usize, usize)> {
    for i in from..buffer.len() {
        if buffer[i..].starts_with(b"\n\n") {
            return Some((i, 2));
        }
        if buffer[i..].starts_with(b"\r\n\r\n") {
            return Some((i, 4));
        }
    }
    None
}

/// Parses one event. Returns `None` for events without data, such as comments
/// and keep-alives.
fn parse_event(event: &[u8]) -> Option<SseEvent> {
    let text = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => return Some(SseEvent::Chunk(Err(e.into()))),
    };

    let mut data: Option<String> = None;
    for line in text.lines() {
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match data.as_mut() {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }

    let data = data?;
    if data.trim() == "[DONE]" {
        return Some(SseEvent::Done);
    }
    if data.trim().is_empty() {
        return None;
    }

    let chunk = serde_json::from_str::<Value>(&data).and_then(|value| {
        match value.get("error").filter(|error| !error.is_null()) {
            Some(error) => Ok(Err(Error::streaming(error_message(error), None))),
            None => serde_json::from_value::<ChatCompletionChunk>(value).map(Ok),
        }
    });
    Some(SseEvent::Chunk(match chunk {
        Ok(chunk) => chunk,
        Err(e) => Err(Error::serialization(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        )),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    type Part = std::result::Result<Bytes, std::io::Error>;

    fn data(bytes: &'static [u8]) -> Part {
        Ok(Bytes::from_static(bytes))
    }

    async fn collect(parts: Vec<Part>) -> Vec<Result<ChatCompletionChunk>> {
        process_sse(stream::iter(parts)).collect().await
    }

    #[tokio::test]
    async fn parses_chunks_until_done() {
        let events = collect(vec![
            data(b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n"),
            data(b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n"),
            data(b"data: [DONE]\n\n"),
            data(b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"late\"}}]}\n\n"),
        ])
        .await;
        let texts: Vec<_> = events
            .into_iter()
            .map(|e| e.unwrap().first_delta().unwrap().content.clone().unwrap())
            .collect();
        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn event_split_across_reads() {
        let events = collect(vec![
            data(b"data: {\"choices\":[{\"index\":0,\"de"),
            data(b"lta\":{\"content\":\"caf\xc3"),
            data(b"\xa9\"}}]}\r\n\r\ndata: [DONE]\r\n\r\n"),
        ])
        .await;
        assert_eq!(events.len(), 1);
        let chunk = events.into_iter().next().unwrap().unwrap();
        assert_eq!(chunk.first_delta().unwrap().content.as_deref(), Some("café"));
    }

    #[tokio::test]
    async fn comments_and_keepalives_are_skipped() {
        let events = collect(vec![
            data(b": keep-alive\n\n"),
            data(b"event: ping\n\n"),
            data(b"data: {\"choices\":[]}\n\n"),
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert!(events[0].as_ref().unwrap().choices.is_empty());
    }

    #[tokio::test]
    async fn transport_error_is_streaming_error() {
        let events = collect(vec![
            data(b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n\n"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            data(b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"b\"}}]}\n\n"),
        ])
        .await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(events[1].as_ref().unwrap_err().is_streaming());
    }

    #[tokio::test]
    async fn error_payload_is_streaming_error() {
        let events = collect(vec![data(
            b"data: {\"error\":{\"message\":\"model crashed\"}}\n\n",
        )])
        .await;
        let err = events.into_iter().next().unwrap().unwrap_err();
        assert!(err.is_streaming());
        assert_eq!(err.to_string(), "Streaming error: model crashed");
    }

    #[tokio::test]
    async fn trailing_event_without_blank_line() {
        let events = collect(vec![data(
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"end\"}}]}",
        )])
        .await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn invalid_utf8_is_encoding_error() {
        let events = collect(vec![
            data(b"data: {\"choices\":[]}\xff\n\n"),
            data(b"data: {\"choices\":[]}\n\n"),
        ])
        .await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Err(Error::Encoding { .. })));
        assert!(events[1].is_ok());
    }

    #[tokio::test]
    async fn event_trickling_in_byte_by_byte() {
        let event = b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"slow\"}}]}\r\n\r\ndata: [DONE]\r\n\r\n";
        let parts = event
            .chunks(1)
            .map(|byte| Ok(Bytes::copy_from_slice(byte)))
            .collect();
        let events = collect(parts).await;
        assert_eq!(events.len(), 1);
        let chunk = events.into_iter().next().unwrap().unwrap();
        assert_eq!(chunk.first_delta().unwrap().content.as_deref(), Some("slow"));
    }

    #[test]
    fn delimiter_search_resumes_before_previous_end() {
        let mut buffer = b"data: x\r\n\r".to_vec();
        let mut scanned = 0;
        assert_eq!(take_event(&mut buffer, &mut scanned), None);
        assert_eq!(scanned, buffer.len());
        buffer.extend_from_slice(b"\ndata: y");
        assert_eq!(take_event(&mut buffer, &mut scanned), Some(b"data: x".to_vec()));
        assert_eq!(scanned, 0);
        assert_eq!(buffer, b"data: y");
    }

    #[tokio::test]
    async fn malformed_json_is_serialization_error() {
        let events = collect(vec![data(b"data: {not json}\n\n")]).await;
        assert!(matches!(
            events[0],
            Err(Error::Serialization { .. })
        ));
    }
}
