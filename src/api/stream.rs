// src/api/stream.rs
//! Streaming endpoint framing.
//!
//! Twitter streams deliver one JSON document per `\r\n`-terminated line,
//! with blank lines as keep-alives. A reader task splits the body into
//! lines and forwards decoded documents over a bounded channel.

use super::TweetStream;
use crate::constants::STREAM_CHANNEL_CAPACITY;
use crate::error::TwitterError;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;

/// Accumulates body chunks and yields complete, non-empty lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and drains every complete line it finishes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let text = String::from_utf8_lossy(&line).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    /// Returns whatever is left once the body ends without a final newline.
    pub fn finish(self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.buffer).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// Decodes one stream line into a JSON document.
pub fn decode_line(line: &str) -> Result<Value, TwitterError> {
    serde_json::from_str(line).map_err(|e| {
        log::warn!("Undecodable stream line ({}): {:.80}", e, line);
        TwitterError::Stream(format!("undecodable stream message: {}", e))
    })
}

/// Spawns a task reading `response` and returns the decoded documents as a stream.
///
/// The task ends when the body ends, on the first transport error, or as soon
/// as the returned stream is dropped. Keep-alives never reach the consumer, so
/// the task watches for the receiver going away instead of relying on a failed
/// send; dropping the body then closes the connection.
pub fn spawn_reader(response: reqwest::Response) -> TweetStream {
    let (tx, mut rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        let mut framer = LineFramer::new();

        loop {
            let chunk = tokio::select! {
                _ = tx.closed() => {
                    log::debug!("Stream consumer dropped, closing connection");
                    return;
                }
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    for line in framer.push(&bytes) {
                        if tx.send(decode_line(&line)).await.is_err() {
                            log::debug!("Stream consumer dropped, closing connection");
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    let _ = tx.send(Err(TwitterError::Http(e))).await;
                    return;
                }
                None => break,
            }
        }

        if let Some(line) = framer.finish() {
            let _ = tx.send(decode_line(&line)).await;
        }
        log::info!("Twitter stream ended");
    });

    stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed()
}
