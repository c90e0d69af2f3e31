//! Server-sent-events transport for the live feed.
//!
//! The backend pushes detection events as `text/event-stream` frames:
//! `data:` lines carrying one JSON event each, terminated by a blank
//! line, with `:` comment lines as keepalives. The response body is
//! consumed incrementally via [`reqwest::Response::bytes_stream`].

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt as _, TryStreamExt as _};
use sentinel_alert_models::PushEvent;

use crate::{EventStream, FeedError, PushChannel};

/// Longest malformed-payload preview included in warn logs.
const PAYLOAD_PREVIEW_LEN: usize = 200;

type ByteChunks = BoxStream<'static, Result<Vec<u8>, reqwest::Error>>;

/// Push channel over HTTP server-sent events.
pub struct SseChannel {
    client: reqwest::Client,
    url: String,
}

impl SseChannel {
    #[must_use]
    pub const fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl PushChannel for SseChannel {
    async fn open(&self) -> Result<Box<dyn EventStream>, FeedError> {
        log::debug!("feed: opening event stream at {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(Box::new(SseStream {
            chunks: response
                .bytes_stream()
                .map_ok(|chunk| chunk.to_vec())
                .boxed(),
            parser: SseParser::new(),
        }))
    }
}

struct SseStream {
    chunks: ByteChunks,
    parser: SseParser,
}

#[async_trait]
impl EventStream for SseStream {
    async fn next_event(&mut self) -> Result<Option<PushEvent>, FeedError> {
        loop {
            if let Some(event) = self.parser.pop() {
                return Ok(Some(event));
            }
            match self.chunks.next().await {
                Some(Ok(chunk)) => self.parser.push(&chunk),
                Some(Err(e)) => return Err(FeedError::Http(e)),
                None => return Ok(None),
            }
        }
    }
}

/// Incremental `text/event-stream` frame parser.
///
/// Feed raw bytes with [`Self::push`]; completed events come out of
/// [`Self::pop`]. Chunk boundaries may fall anywhere, including inside
/// a UTF-8 sequence, so the buffer is kept as bytes and only complete
/// lines are decoded.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    data: Vec<String>,
    ready: VecDeque<PushEvent>,
}

impl SseParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the response body.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop(); // trailing '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            self.line(&line);
        }
    }

    /// Next completed event, if any.
    pub fn pop(&mut self) -> Option<PushEvent> {
        self.ready.pop_front()
    }

    fn line(&mut self, line: &[u8]) {
        if line.is_empty() {
            self.dispatch();
            return;
        }
        if line.starts_with(b":") {
            // keepalive comment
            return;
        }
        let Ok(text) = std::str::from_utf8(line) else {
            log::warn!("feed: dropping non-UTF-8 line ({} bytes)", line.len());
            return;
        };
        if let Some(value) = text.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        // `event:`/`id:`/`retry:` fields are unused by this protocol.
    }

    fn dispatch(&mut self) {
        if self.data.is_empty() {
            return;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        match serde_json::from_str::<PushEvent>(&payload) {
            Ok(event) => self.ready.push_back(event),
            Err(e) => {
                let preview: String = payload.chars().take(PAYLOAD_PREVIEW_LEN).collect();
                log::warn!("feed: dropping malformed event: {e} (payload: {preview})");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt as _;
    use serde_json::json;

    use super::{SseParser, SseStream};
    use crate::EventStream as _;

    fn payload(kind: &str, pincode: u32, message: &str) -> String {
        json!({ "type": kind, "pincode": pincode, "message": message }).to_string()
    }

    #[test]
    fn assembles_events_across_chunk_boundaries() {
        let mut parser = SseParser::new();
        let frame = format!(
            "data: {}\n\n",
            payload("Phantom Village", 110_001, "Spike detected")
        );
        let (head, tail) = frame.split_at(17);

        parser.push(head.as_bytes());
        assert!(parser.pop().is_none());

        parser.push(tail.as_bytes());
        let event = parser.pop().unwrap();
        assert_eq!(event.kind, "Phantom Village");
        assert_eq!(event.pincode, 110_001);
        assert_eq!(event.message, "Spike detected");
        assert!(parser.pop().is_none());
    }

    #[test]
    fn keepalive_comments_produce_nothing() {
        let mut parser = SseParser::new();
        parser.push(b":keepalive\n\n");
        parser.push(b": ping\n\n");
        assert!(parser.pop().is_none());
    }

    #[test]
    fn malformed_payloads_are_dropped_not_fatal() {
        let mut parser = SseParser::new();
        parser.push(b"data: {not json}\n\n");
        assert!(parser.pop().is_none());

        let frame = format!("data: {}\n\n", payload("Update Mill", 400_001, "still alive"));
        parser.push(frame.as_bytes());
        assert_eq!(parser.pop().unwrap().kind, "Update Mill");
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut parser = SseParser::new();
        parser.push(
            format!(
                "data: {}\r\n\r\n",
                payload("Bot Operator", 500_001, "round numbers")
            )
            .as_bytes(),
        );
        assert_eq!(parser.pop().unwrap().kind, "Bot Operator");
    }

    #[test]
    fn multiple_events_in_one_chunk_all_surface() {
        let mut parser = SseParser::new();
        let chunk = format!(
            "data: {}\n\ndata: {}\n\n",
            payload("Sunday Shift", 600_001, "weekend spike"),
            payload("Biometric Bypass", 700_001, "bypass burst"),
        );
        parser.push(chunk.as_bytes());
        assert_eq!(parser.pop().unwrap().kind, "Sunday Shift");
        assert_eq!(parser.pop().unwrap().kind, "Biometric Bypass");
        assert!(parser.pop().is_none());
    }

    #[tokio::test]
    async fn stream_pumps_chunks_until_server_close() {
        let frame = format!("data: {}\n\n", payload("Phantom Village", 110_001, "x"));
        let (head, tail) = frame.split_at(9);
        let chunks = vec![head.as_bytes().to_vec(), tail.as_bytes().to_vec()];
        let mut stream = SseStream {
            chunks: futures::stream::iter(
                chunks.into_iter().map(Ok::<Vec<u8>, reqwest::Error>),
            )
            .boxed(),
            parser: SseParser::new(),
        };

        let event = stream.next_event().await.unwrap().unwrap();
        assert_eq!(event.kind, "Phantom Village");
        assert!(stream.next_event().await.unwrap().is_none());
    }
}
