// tests/pipeline_stream.rs
//! Streaming mode: per-event processing, unordered completion, stop.

mod common;

use common::{resolve, FakeApi, FakeStore, PendingApi};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use twitter2mongodb::constants::EVENT_QUEUE_CAPACITY;
use twitter2mongodb::{
    ApiOptions, AppError, EventCallback, PayloadCheck, Pipeline, PipelineOptions,
    PipelineOutput, PipelineStream, StoreError, StreamEvent, TwitterError, WriteMethod,
};

fn stream_options() -> PipelineOptions {
    PipelineOptions {
        api: ApiOptions {
            method: Some("stream".to_string()),
            path: Some("statuses/filter".to_string()),
            parameters: Some(json!({"track": "rust"}).into()),
            ..ApiOptions::default()
        },
        ..PipelineOptions::default()
    }
}

async fn collect(mut stream: PipelineStream) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) =
        tokio::time::timeout(Duration::from_secs(5), stream.next_event())
            .await
            .expect("stream should finish")
    {
        events.push(event);
    }
    events
}

fn event_ids(events: &[StreamEvent]) -> Vec<i64> {
    events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Data(Ok(record)) => record.api.payload.get("id").and_then(Value::as_i64),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_each_event_is_written_and_reported() {
    let api = Arc::new(FakeApi::streaming(vec![
        Ok(json!({"id": 1})),
        Ok(json!({"id": 2})),
        Ok(json!({"id": 3})),
    ]));
    let store = Arc::new(FakeStore::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_callback = Arc::clone(&seen);

    let options = PipelineOptions {
        on_event: Some(EventCallback::new(move |result| {
            if let Ok(record) = result {
                seen_by_callback
                    .lock()
                    .unwrap()
                    .push(record.api.payload.clone());
            }
        })),
        ..stream_options()
    };

    let stream = Pipeline::new(api.clone(), store.clone())
        .stream(resolve(options))
        .await
        .unwrap();
    let events = collect(stream).await;

    let mut ids = event_ids(&events);
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(events.len(), 3);
    assert_eq!(store.written().len(), 3);
    assert_eq!(seen.lock().unwrap().len(), 3);
    assert_eq!(api.streams_opened.load(Ordering::SeqCst), 1);
    for event in &events {
        let StreamEvent::Data(Ok(record)) = event else {
            panic!("unexpected event {:?}", event);
        };
        assert!(record.database.was_written());
        assert_eq!(record.database.collection_name(), "twitter2mongodb_data");
    }
}

#[tokio::test]
async fn test_completions_follow_write_latency() {
    let api = Arc::new(FakeApi::streaming(vec![
        Ok(json!({"id": 1})),
        Ok(json!({"id": 2})),
        Ok(json!({"id": 3})),
    ]));
    let store = Arc::new(
        FakeStore::new()
            .with_delay(1, Duration::from_millis(300))
            .with_delay(2, Duration::from_millis(150)),
    );

    let stream = Pipeline::new(api, store.clone())
        .stream(resolve(stream_options()))
        .await
        .unwrap();
    let events = collect(stream).await;

    assert_eq!(event_ids(&events), vec![3, 2, 1]);
    let written: Vec<Value> = store.written().into_iter().map(|(_, payload)| payload).collect();
    assert_eq!(written, vec![json!({"id": 3}), json!({"id": 2}), json!({"id": 1})]);
}

#[tokio::test]
async fn test_upstream_errors_are_delivered_as_error_events() {
    let api = Arc::new(FakeApi::streaming(vec![
        Ok(json!({"id": 1})),
        Err("invalid JSON frame".to_string()),
    ]));
    let store = Arc::new(FakeStore::new());

    let stream = Pipeline::new(api, store.clone())
        .stream(resolve(stream_options()))
        .await
        .unwrap();
    let events = collect(stream).await;

    assert_eq!(events.len(), 2);
    let errors: Vec<&AppError> = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Error(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], AppError::Upstream(TwitterError::Stream(_))));
    assert_eq!(store.written().len(), 1);
}

#[tokio::test]
async fn test_open_failure_is_an_error_event() {
    let api = Arc::new(FakeApi::failing(401));
    let store = Arc::new(FakeStore::new());

    let stream = Pipeline::new(api, store.clone())
        .stream(resolve(stream_options()))
        .await
        .unwrap();
    let events = collect(stream).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Error(AppError::Upstream(e)) => assert_eq!(e.status(), Some(401)),
        other => panic!("unexpected event {:?}", other),
    }
    assert!(store.written().is_empty());
}

#[tokio::test]
async fn test_connection_failure_is_returned_directly() {
    let api = Arc::new(FakeApi::streaming(vec![Ok(json!({"id": 1}))]));
    let store = Arc::new(FakeStore::refusing_connection());

    let err = Pipeline::new(api.clone(), store)
        .stream(resolve(stream_options()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "connection");
    assert_eq!(api.streams_opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_check_is_applied_per_event() {
    let api = Arc::new(FakeApi::streaming(vec![
        Ok(json!({"id": 1, "items": []})),
        Ok(json!({"id": 2, "items": [{"id": 20}]})),
    ]));
    let store = Arc::new(FakeStore::new());
    let options = PipelineOptions {
        transform_query: Some("items".to_string()),
        database: twitter2mongodb::DatabaseOptions {
            write_method: Some("insertMany".to_string()),
            check: Some(PayloadCheck::skip_empty()),
            ..Default::default()
        },
        ..stream_options()
    };

    let stream = Pipeline::new(api, store.clone())
        .stream(resolve(options))
        .await
        .unwrap();
    let events = collect(stream).await;

    assert_eq!(events.len(), 2);
    let written_flags: Vec<bool> = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Data(Ok(record)) => Some(record.database.was_written()),
            _ => None,
        })
        .collect();
    assert_eq!(written_flags.iter().filter(|w| **w).count(), 1);
    assert_eq!(
        store.written(),
        vec![(WriteMethod::InsertMany, json!([{"id": 20}]))]
    );
}

#[tokio::test]
async fn test_stop_ends_an_idle_stream() {
    let store = Arc::new(FakeStore::new());

    let output = Pipeline::new(Arc::new(PendingApi), store)
        .execute(resolve(stream_options()))
        .await
        .unwrap();
    let PipelineOutput::Streaming(mut stream) = output else {
        panic!("expected a live stream");
    };

    let control = stream.control();
    assert!(!control.is_stopped());
    control.stop();
    assert!(stream.control().is_stopped());

    let next = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("stopped stream should close");
    assert!(next.is_none());
}

#[tokio::test]
async fn test_stream_rejects_rest_method() {
    let api = Arc::new(FakeApi::returning(json!({})));
    let store = Arc::new(FakeStore::new());

    let err = Pipeline::new(api, store.clone())
        .stream(resolve(PipelineOptions::default()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "configuration");
    assert_eq!(store.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_writes_reach_callback_and_handle() {
    let api = Arc::new(FakeApi::streaming(vec![
        Ok(json!({"id": 1})),
        Ok(json!({"id": 2})),
    ]));
    let store = Arc::new(FakeStore::rejecting_writes());
    let failures = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&failures);

    let options = PipelineOptions {
        on_event: Some(EventCallback::new(move |result| match result {
            Ok(_) => recorded.lock().unwrap().push("ok".to_string()),
            Err(e) => recorded.lock().unwrap().push(e.kind().to_string()),
        })),
        ..stream_options()
    };

    let stream = Pipeline::new(api, store.clone())
        .stream(resolve(options))
        .await
        .unwrap();
    let events = collect(stream).await;

    assert_eq!(*failures.lock().unwrap(), vec!["write", "write"]);
    assert_eq!(events.len(), 2);
    for event in &events {
        assert!(
            matches!(
                event,
                StreamEvent::Data(Err(AppError::Write {
                    method: WriteMethod::InsertOne,
                    source: StoreError::Rejected(_),
                }))
            ),
            "unexpected event {:?}",
            event
        );
    }
    assert!(store.written().is_empty());
}

#[tokio::test]
async fn test_callback_consumers_do_not_accumulate_records() {
    let total = EVENT_QUEUE_CAPACITY * 4;
    let api = Arc::new(FakeApi::streaming(
        (0..total).map(|id| Ok(json!({"id": id}))).collect(),
    ));
    let store = Arc::new(FakeStore::new());
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let options = PipelineOptions {
        on_event: Some(EventCallback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
        ..stream_options()
    };

    let stream = Pipeline::new(api, store.clone())
        .stream(resolve(options))
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while seen.load(Ordering::SeqCst) < total {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("every event should reach the callback");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let queued = collect(stream).await;
    assert_eq!(store.written().len(), total);
    assert!(!queued.is_empty());
    assert!(
        queued.len() <= EVENT_QUEUE_CAPACITY,
        "{} records queued",
        queued.len()
    );
}
