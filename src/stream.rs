use std::fmt::Display;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use anyhow::Result;
use futures_util::{Stream, StreamExt};
use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::SettingSnapshot;
use crate::events::{EventBus, UiEvent};

/// Incremental parser for `text/event-stream` framing. Accumulates
/// `data:` lines, dispatches on blank-line boundaries, ignores comments
/// and non-data fields, tolerates CRLF.
///
/// Buffers raw bytes and decodes per completed event: transport chunks
/// split anywhere, including mid-codepoint, and UTF-8 continuation bytes
/// can never look like the `\n\n` boundary.
#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the data payload of every event completed
    /// by it. Partial events stay buffered for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // Normalizing CR away up front keeps boundary detection to one
        // pattern and survives CRLF split across chunks.
        for &byte in chunk {
            if byte != b'\r' {
                self.buffer.push(byte);
            }
        }

        let mut payloads = Vec::new();
        while let Some(boundary) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.buffer.drain(..boundary + 2).collect();
            let event = String::from_utf8_lossy(&event);
            if let Some(data) = event_data(&event) {
                payloads.push(data);
            }
        }
        payloads
    }
}

fn event_data(event: &str) -> Option<String> {
    let mut lines = Vec::new();
    for line in event.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
        // Other fields (event:, id:, retry:) are irrelevant here.
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Drive the settings stream until cancelled: connect, forward parsed
/// snapshots, and on any failure or stream end reconnect after a fixed
/// backoff, indefinitely. Malformed payloads are logged and dropped.
///
/// Generic over the connector so reconnect timing is testable without a
/// network; production use connects through `ApiClient::settings_stream`.
pub(crate) async fn run_stream_loop<C, F, S, B, E>(
    mut connect: C,
    backoff: Duration,
    token: CancellationToken,
    snapshots: mpsc::UnboundedSender<SettingSnapshot>,
    bus: EventBus,
) where
    C: FnMut() -> F,
    F: Future<Output = Result<S>>,
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    loop {
        match connect().await {
            Ok(stream) => {
                info!("settings stream connected");
                bus.emit(UiEvent::StreamConnected);
                let mut stream = pin!(stream);
                let mut parser = SseParser::new();
                loop {
                    tokio::select! {
                        chunk = stream.next() => match chunk {
                            Some(Ok(bytes)) => {
                                for payload in parser.push(bytes.as_ref()) {
                                    match serde_json::from_str::<SettingSnapshot>(&payload) {
                                        Ok(snapshot) => {
                                            if snapshots.send(snapshot).is_err() {
                                                return;
                                            }
                                        }
                                        Err(err) => {
                                            warn!("discarding malformed stream payload: {err}");
                                        }
                                    }
                                }
                            }
                            Some(Err(err)) => {
                                error!("settings stream error: {err}");
                                break;
                            }
                            None => {
                                warn!("settings stream ended");
                                break;
                            }
                        },
                        _ = token.cancelled() => return,
                    }
                }
                bus.emit(UiEvent::StreamDisconnected);
            }
            Err(err) => {
                error!("settings stream connect failed: {err:#}");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            _ = token.cancelled() => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use tokio::time::Instant;

    #[test]
    fn parser_assembles_single_event() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: {\"a\":1}\n\n");
        assert_eq!(events, vec!["{\"a\":1}"]);
    }

    #[test]
    fn parser_buffers_partial_events() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: {\"a\"").is_empty());
        assert!(parser.push(b":1}\n").is_empty());
        let events = parser.push(b"\ndata: {\"b\":2}\n\n");
        assert_eq!(events, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn parser_ignores_comments_and_other_fields() {
        let mut parser = SseParser::new();
        let events = parser.push(b": keepalive\n\nevent: tick\nid: 7\ndata: {}\n\n");
        assert_eq!(events, vec!["{}"]);
    }

    #[test]
    fn parser_handles_crlf_framing() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: {\"a\":1}\r\n\r\n");
        assert_eq!(events, vec!["{\"a\":1}"]);
    }

    #[test]
    fn parser_joins_multi_line_data() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: line1\ndata: line2\n\n");
        assert_eq!(events, vec!["line1\nline2"]);
    }

    #[test]
    fn parser_keeps_codepoint_split_across_chunks() {
        // Persian display names arrive multi-byte; the transport may cut
        // a chunk anywhere, including inside a codepoint.
        let mut parser = SseParser::new();
        let event = "data: {\"t1\":\"ا\"}\n\n".as_bytes();
        let split = 14; // one byte into the two-byte codepoint
        assert!(parser.push(&event[..split]).is_empty());
        let events = parser.push(&event[split..]);
        assert_eq!(events, vec!["{\"t1\":\"ا\"}"]);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_after_exactly_the_backoff() {
        let attempts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let token = CancellationToken::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let connect_times = attempts.clone();
        let connect = move || {
            connect_times.lock().unwrap().push(Instant::now());
            async move {
                // Connects fine, then the stream ends immediately.
                Ok(futures_util::stream::iter(
                    Vec::<Result<Vec<u8>, std::io::Error>>::new(),
                ))
            }
        };

        let loop_token = token.clone();
        let handle = tokio::spawn(run_stream_loop(
            connect,
            Duration::from_millis(3000),
            loop_token,
            tx,
            EventBus::default(),
        ));

        tokio::time::sleep(Duration::from_millis(7000)).await;
        token.cancel();
        handle.await.unwrap();

        let times = attempts.lock().unwrap();
        // t=0, t=3000, t=6000: no retry fires sooner than the backoff.
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_millis(3000));
        assert_eq!(times[2] - times[1], Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payloads_are_dropped_not_fatal() {
        let token = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"data: not json\n\n".to_vec()),
            Ok(b"data: {\"LastUpdate\":5,\"setting\":{\"t1\":\"9\"}}\n\n".to_vec()),
        ];
        let mut chunks = Some(chunks);
        let connect = move || {
            let batch = chunks.take().unwrap_or_default();
            async move { Ok(futures_util::stream::iter(batch)) }
        };

        let loop_token = token.clone();
        tokio::spawn(run_stream_loop(
            connect,
            Duration::from_millis(3000),
            loop_token,
            tx,
            EventBus::default(),
        ));

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.last_update, Some(5.0));
        token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn multibyte_values_survive_chunk_boundaries() {
        let token = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let event = "data: {\"LastUpdate\":5,\"setting\":{\"t1\":\"ا\"}}\n\n".as_bytes();
        let split = event.len() - 6; // cuts the value's codepoint in two
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
            vec![Ok(event[..split].to_vec()), Ok(event[split..].to_vec())];
        let mut chunks = Some(chunks);
        let connect = move || {
            let batch = chunks.take().unwrap_or_default();
            async move { Ok(futures_util::stream::iter(batch)) }
        };

        let loop_token = token.clone();
        tokio::spawn(run_stream_loop(
            connect,
            Duration::from_millis(3000),
            loop_token,
            tx,
            EventBus::default(),
        ));

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(
            snapshot.setting["t1"],
            serde_json::Value::String("ا".to_string())
        );
        token.cancel();
    }
}
