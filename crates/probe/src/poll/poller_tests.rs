// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use serde_json::json;

use super::*;
use crate::error::ErrorCode;
use crate::test_support::{FakeSearch, SearchStep};

fn settings(abort_policy: AbortPolicy) -> PollSettings {
    PollSettings {
        initial_delay: Duration::from_millis(1000),
        poll_interval: Duration::from_millis(1000),
        ingestion_skew: Duration::from_secs(2),
        default_max_wait: Duration::from_millis(5000),
        abort_policy,
    }
}

fn poller(search: &Arc<FakeSearch>, abort_policy: AbortPolicy) -> EventualConsistencyPoller {
    EventualConsistencyPoller::new(search.clone(), settings(abort_policy))
}

fn request() -> PollRequest {
    PollRequest::new(
        Utc::now(),
        r#"{ $.detail-type = "TestEventProcessed" }"#,
        "/aws/events/TestBus",
    )
}

#[tokio::test(start_paused = true)]
async fn returns_payload_on_third_query() -> anyhow::Result<()> {
    let payload = json!({ "detail": { "id": "0b6f3c1e-8d8a-4a53-9a65-2f7e2f7a1c11" } });
    let search = Arc::new(FakeSearch::match_after(2, &payload));

    let found = poller(&search, AbortPolicy::Timeout).await_match(&request(), None).await?;

    assert_eq!(found, payload);
    assert_eq!(search.query_count().await, 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn times_out_when_nothing_matches() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::default());
    let started = tokio::time::Instant::now();

    let err = poller(&search, AbortPolicy::Timeout)
        .await_match(&request(), None)
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected timeout"))?;

    let elapsed = started.elapsed();
    assert_eq!(err.code(), ErrorCode::Timeout);
    assert!(elapsed >= Duration::from_millis(5000), "elapsed {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(7000), "elapsed {elapsed:?}");
    // Queries at 1s..=5s; the 6s check trips the deadline.
    assert_eq!(search.query_count().await, 5);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn multiple_records_are_rejected() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::new([SearchStep::Records(vec![
        LogRecord::new(r#"{"n":1}"#),
        LogRecord::new(r#"{"n":2}"#),
    ])]));

    let err = poller(&search, AbortPolicy::Timeout)
        .await_match(&request(), None)
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected error"))?;

    assert!(matches!(err, ProbeError::MultipleMatches { count: 2, .. }), "{err}");
    assert_eq!(search.query_count().await, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn abort_is_timeout_by_default() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::new([SearchStep::Aborted]));

    let err = poller(&search, AbortPolicy::Timeout)
        .await_match(&request(), None)
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected error"))?;

    assert!(err.is_timeout(), "{err}");
    assert!(err.to_string().contains("aborted"), "{err}");
    assert_eq!(search.query_count().await, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn abort_is_retried_under_retry_policy() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::new([
        SearchStep::Aborted,
        SearchStep::Records(vec![LogRecord::new(r#"{"ok":true}"#)]),
    ]));

    let found = poller(&search, AbortPolicy::Retry).await_match(&request(), None).await?;

    assert_eq!(found, json!({ "ok": true }));
    assert_eq!(search.query_count().await, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn backend_error_is_not_retried() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::new([SearchStep::Fail("ResourceNotFoundException".to_owned())]));

    let err = poller(&search, AbortPolicy::Retry)
        .await_match(&request(), None)
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected error"))?;

    assert_eq!(err.code(), ErrorCode::SearchBackend);
    assert!(err.to_string().contains("/aws/events/TestBus"), "{err}");
    assert!(err.to_string().contains("ResourceNotFoundException"), "{err}");
    assert_eq!(search.query_count().await, 1);
    Ok(())
}

#[yare::parameterized(
    not_json  = { Some("processed ok") },
    truncated = { Some("{\"detail\":") },
    missing   = { None },
)]
fn undecodable_record(message: Option<&str>) {
    let record = LogRecord { message: message.map(str::to_owned) };
    assert!(matches!(decode(&record), Err(ProbeError::Decode(_))));
}

#[tokio::test(start_paused = true)]
async fn undecodable_match_is_decode_error() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::new([SearchStep::Records(vec![LogRecord::new("nope")])]));

    let result = poller(&search, AbortPolicy::Timeout).await_match(&request(), None).await;

    assert!(matches!(result, Err(ProbeError::Decode(_))), "{result:?}");
    assert_eq!(search.query_count().await, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn window_is_fixed_and_skewed() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::match_after(3, &json!({})));
    let req = request();

    poller(&search, AbortPolicy::Timeout).await_match(&req, None).await?;

    let queries = search.queries().await;
    assert_eq!(queries.len(), 4);
    assert_eq!(queries[0].start, req.since - TimeDelta::seconds(2));
    assert!(queries.iter().all(|q| q == &queries[0]), "window moved between queries");
    assert!(queries[0].end > req.since);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn first_delay_uses_initial_delay() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::match_after(1, &json!({ "ok": 1 })));
    let poller = EventualConsistencyPoller::new(
        search.clone(),
        PollSettings {
            initial_delay: Duration::from_millis(2000),
            ..settings(AbortPolicy::Timeout)
        },
    );
    let started = tokio::time::Instant::now();

    poller.await_match(&request(), None).await?;

    assert_eq!(started.elapsed(), Duration::from_millis(3000));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn request_max_wait_overrides_default() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::default());
    let req = request().max_wait(Duration::from_millis(1500));

    let err = poller(&search, AbortPolicy::Timeout)
        .await_match(&req, None)
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected timeout"))?;

    assert!(err.is_timeout());
    assert_eq!(search.query_count().await, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn wait_shorter_than_initial_delay_never_queries() -> anyhow::Result<()> {
    let search = Arc::new(FakeSearch::match_after(0, &json!({ "ok": 1 })));
    let poller = EventualConsistencyPoller::new(
        search.clone(),
        PollSettings {
            initial_delay: Duration::from_millis(2000),
            ..settings(AbortPolicy::Timeout)
        },
    );
    let started = tokio::time::Instant::now();

    let err = poller
        .await_match(&request().max_wait(Duration::from_millis(1500)), None)
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected timeout"))?;

    assert_eq!(err.code(), ErrorCode::Timeout);
    assert_eq!(search.query_count().await, 0);
    assert_eq!(started.elapsed(), Duration::from_millis(2000));
    Ok(())
}

#[test]
fn wait_millis_saturate() {
    assert_eq!(whole_millis(Duration::from_millis(1500)), 1500);
    assert_eq!(whole_millis(Duration::MAX), u64::MAX);
}
