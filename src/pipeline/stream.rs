// src/pipeline/stream.rs
//! Streaming mode: one independent transform/check/write task per event.
//!
//! The handle is returned before any data arrives. Events complete in
//! whatever order their writes finish; nothing here serializes them.

use super::result::{DatabaseOutcome, StreamApiOutcome, StreamRecord};
use super::process_payload;
use crate::api::TwitterApi;
use crate::config::PipelineConfig;
use crate::constants::EVENT_QUEUE_CAPACITY;
use crate::error::AppError;
use crate::store::DocumentCollection;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};

/// One item delivered by a [`PipelineStream`].
#[derive(Debug)]
pub enum StreamEvent {
    /// A data event finished processing, successfully or not.
    Data(Result<StreamRecord, AppError>),
    /// The upstream stream reported an error.
    Error(AppError),
}

/// Cloneable stop switch for a running stream.
#[derive(Clone, Debug)]
pub struct StreamControl {
    stop: Arc<watch::Sender<bool>>,
}

impl StreamControl {
    fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            stop: Arc::new(stop),
        }
    }

    /// Disconnects from the upstream. Events already being processed still finish.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.stop.subscribe()
    }
}

/// Everything one stream invocation's event tasks share.
struct StreamContext {
    config: PipelineConfig,
    collection: Arc<dyn DocumentCollection>,
    control: StreamControl,
    events: mpsc::Sender<StreamEvent>,
}

impl StreamContext {
    /// Queues an event for the handle.
    ///
    /// Data events already handed to the `on_event` callback are queued only
    /// while there is room, so a caller reading through the callback alone
    /// does not accumulate records. Everything else waits for the reader.
    async fn deliver(&self, event: StreamEvent) {
        let observed = matches!(event, StreamEvent::Data(_)) && self.config.on_event.is_some();
        if !observed {
            let _ = self.events.send(event).await;
            return;
        }
        if let Err(mpsc::error::TrySendError::Full(_)) = self.events.try_send(event) {
            log::debug!(
                "Event queue full ({} pending); dropping an event already passed to on_event",
                EVENT_QUEUE_CAPACITY
            );
        }
    }
}

/// Live handle over a streaming pipeline.
///
/// Yields events until the upstream ends or is stopped and every in-flight
/// event has been delivered. Dropping the handle stops the stream.
pub struct PipelineStream {
    events: mpsc::Receiver<StreamEvent>,
    control: StreamControl,
}

impl PipelineStream {
    /// Starts the background driver and returns immediately.
    pub(super) fn spawn(
        api: Arc<dyn TwitterApi>,
        collection: Arc<dyn DocumentCollection>,
        config: PipelineConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let control = StreamControl::new();
        let context = Arc::new(StreamContext {
            config,
            collection,
            control: control.clone(),
            events: tx,
        });

        tokio::spawn(drive(api, context));

        Self {
            events: rx,
            control,
        }
    }

    /// Waits for the next event; `None` once the stream is finished.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    pub fn control(&self) -> StreamControl {
        self.control.clone()
    }

    pub fn stop(&self) {
        self.control.stop();
    }
}

impl std::fmt::Debug for PipelineStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStream")
            .field("stopped", &self.control.is_stopped())
            .finish_non_exhaustive()
    }
}

impl Stream for PipelineStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for PipelineStream {
    fn drop(&mut self) {
        self.control.stop();
    }
}

/// Opens the upstream and fans each item out to its own task.
async fn drive(api: Arc<dyn TwitterApi>, context: Arc<StreamContext>) {
    let mut stop = context.control.subscribe();
    let settings = &context.config.api;

    log::info!("Opening stream {}", settings.path);
    let opened = tokio::select! {
        _ = stopped(&mut stop) => return,
        opened = api.stream(&settings.path, &settings.parameters) => opened,
    };

    let mut upstream = match opened {
        Ok(upstream) => upstream,
        Err(e) => {
            log::error!("Failed to open stream {}: {}", settings.path, e);
            context
                .deliver(StreamEvent::Error(AppError::Upstream(e)))
                .await;
            return;
        }
    };

    loop {
        tokio::select! {
            _ = stopped(&mut stop) => {
                log::info!("Stream {} stopped by caller", settings.path);
                break;
            }
            item = upstream.next() => match item {
                Some(Ok(payload)) => {
                    tokio::spawn(handle_event(Arc::clone(&context), payload));
                }
                Some(Err(e)) => {
                    log::warn!("Stream {} reported an error: {}", settings.path, e);
                    context
                        .deliver(StreamEvent::Error(AppError::Upstream(e)))
                        .await;
                }
                None => {
                    log::info!("Stream {} ended", settings.path);
                    break;
                }
            }
        }
    }
}

/// Transforms, checks and writes one event, then reports its own result.
async fn handle_event(context: Arc<StreamContext>, raw: Value) {
    let result = process_payload(context.collection.as_ref(), &context.config, raw)
        .await
        .map(|(payload, write_result)| StreamRecord {
            api: StreamApiOutcome {
                stream: context.control.clone(),
                payload,
            },
            database: DatabaseOutcome {
                collection: Arc::clone(&context.collection),
                write_result,
            },
        });

    if let Err(e) = &result {
        log::warn!("Stream event failed at {} stage: {}", e.kind(), e);
    }
    if let Some(callback) = &context.config.on_event {
        callback.call(result.as_ref());
    }
    context.deliver(StreamEvent::Data(result)).await;
}

async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}
