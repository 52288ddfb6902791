use anyhow::Result;
use futures::{Stream, StreamExt};
use reqwest::Response;
use std::collections::VecDeque;
use std::pin::Pin;

use delve_types::RunEvent;

use crate::cancel::CancelToken;

/// Parse a LangGraph run stream into [`RunEvent`]s.
///
/// The wire format is SSE with named events: an `event: <tag>` line
/// followed by one `data: <json>` line. The tag is remembered and
/// attached to the next data payload. Unparseable data lines are
/// logged and skipped so one malformed chunk cannot kill the run.
///
/// The produced stream is lazy, finite, and not rewindable; once the
/// token is cancelled no further events are yielded.
pub fn parse_event_sse_stream(
    response: Response,
    cancel: CancelToken,
) -> Pin<Box<dyn Stream<Item = Result<RunEvent>> + Send>> {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = VecDeque::with_capacity(8192);
        let mut current_event = String::new();

        loop {
            let chunk_result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                chunk = byte_chunks.next() => match chunk {
                    Some(chunk) => chunk,
                    None => break,
                },
            };

            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes);

                    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                        let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();

                        if cancel.is_cancelled() {
                            return;
                        }

                        if let Ok(line_str) = std::str::from_utf8(&line_bytes) {
                            let line = line_str.trim();

                            if line.is_empty() {
                                continue;
                            }

                            if let Some(tag) = line.strip_prefix("event: ") {
                                current_event = tag.trim().to_string();
                            } else if let Some(data) = line.strip_prefix("data: ") {
                                if data == "[DONE]" {
                                    return;
                                }

                                match serde_json::from_str(data) {
                                    Ok(value) => {
                                        let tag = if current_event.is_empty() {
                                            "message".to_string()
                                        } else {
                                            current_event.clone()
                                        };
                                        yield Ok(RunEvent::new(tag, value));
                                    }
                                    Err(e) => {
                                        tracing::warn!(
                                            event = %current_event,
                                            error = %e,
                                            "skipping unparseable SSE data line"
                                        );
                                    }
                                }
                            }
                        }
                    }
                }
                Err(e) => yield Err(anyhow::anyhow!("Stream error: {}", e)),
            }
        }
    })
}
