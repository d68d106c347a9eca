// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: in-memory collaborators, a manual clock and
//! assertion helpers.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Once};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::credential::{CallerIdentity, Clock, DelegatedCredential, IdentityExchange, RoleRequest};
use crate::params::ParameterStore;
use crate::poll::{LogRecord, LogSearch, SearchError, SearchQuery};
use crate::publish::{BusEvent, EventPublisher, PublishReceipt};
use crate::BoxFuture;

static CRYPTO_INIT: Once = Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
pub fn ensure_crypto_provider() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Assert that `$expr` is an `Err` whose message contains `$substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { millis: Arc::new(AtomicI64::new(start.timestamp_millis())) }
    }

    pub fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    pub fn advance(&self, by: TimeDelta) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn as_clock(&self) -> Clock {
        let this = self.clone();
        Arc::new(move || this.now())
    }
}

/// Identity exchange that issues numbered credentials valid for `ttl`
/// from the supplied clock.
pub struct FakeExchange {
    pub account_id: String,
    pub ttl: TimeDelta,
    clock: Clock,
    fail_exchange: bool,
    introspect_calls: AtomicU32,
    exchange_calls: AtomicU32,
    requests: Mutex<Vec<RoleRequest>>,
}

impl FakeExchange {
    pub fn new(clock: Clock, ttl: TimeDelta) -> Self {
        Self {
            account_id: "123456789012".to_owned(),
            ttl,
            clock,
            fail_exchange: false,
            introspect_calls: AtomicU32::new(0),
            exchange_calls: AtomicU32::new(0),
            requests: Mutex::new(vec![]),
        }
    }

    /// Every exchange fails with "access denied".
    pub fn failing(mut self) -> Self {
        self.fail_exchange = true;
        self
    }

    pub fn introspect_calls(&self) -> u32 {
        self.introspect_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> u32 {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<RoleRequest> {
        self.requests.lock().await.clone()
    }
}

impl IdentityExchange for FakeExchange {
    fn introspect(&self) -> BoxFuture<'_, anyhow::Result<CallerIdentity>> {
        Box::pin(async move {
            self.introspect_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallerIdentity { account_id: self.account_id.clone() })
        })
    }

    fn exchange<'a>(
        &'a self,
        request: &'a RoleRequest,
    ) -> BoxFuture<'a, anyhow::Result<DelegatedCredential>> {
        Box::pin(async move {
            let n = self.exchange_calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests.lock().await.push(request.clone());
            if self.fail_exchange {
                anyhow::bail!("access denied for {}", request.role_arn);
            }
            Ok(DelegatedCredential {
                access_key_id: format!("ASIAFAKE{n}"),
                secret_access_key: format!("secret-{n}"),
                session_token: format!("token-{n}"),
                expiration: (self.clock)() + self.ttl,
            })
        })
    }
}

/// Scripted outcome of one fake search.
pub enum SearchStep {
    Records(Vec<LogRecord>),
    Aborted,
    Fail(String),
}

/// Log search that replays scripted steps, then returns empty results.
#[derive(Default)]
pub struct FakeSearch {
    steps: Mutex<VecDeque<SearchStep>>,
    queries: Mutex<Vec<SearchQuery>>,
    keys_seen: Mutex<Vec<Option<String>>>,
}

impl FakeSearch {
    pub fn new(steps: impl IntoIterator<Item = SearchStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            queries: Mutex::new(vec![]),
            keys_seen: Mutex::new(vec![]),
        }
    }

    /// `empty` empty results followed by one record carrying `payload`.
    pub fn match_after(empty: usize, payload: &serde_json::Value) -> Self {
        let mut steps: Vec<SearchStep> = (0..empty).map(|_| SearchStep::Records(vec![])).collect();
        steps.push(SearchStep::Records(vec![LogRecord::new(payload.to_string())]));
        Self::new(steps)
    }

    pub async fn query_count(&self) -> usize {
        self.queries.lock().await.len()
    }

    pub async fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().await.clone()
    }

    /// Access key id supplied with each query (`None` for ambient calls).
    pub async fn keys_seen(&self) -> Vec<Option<String>> {
        self.keys_seen.lock().await.clone()
    }
}

impl LogSearch for FakeSearch {
    fn search<'a>(
        &'a self,
        query: &'a SearchQuery,
        credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, SearchError>> {
        Box::pin(async move {
            self.queries.lock().await.push(query.clone());
            self.keys_seen.lock().await.push(credential.map(|c| c.access_key_id.clone()));
            match self.steps.lock().await.pop_front() {
                None => Ok(vec![]),
                Some(SearchStep::Records(records)) => Ok(records),
                Some(SearchStep::Aborted) => {
                    Err(SearchError::Aborted(anyhow::anyhow!("request aborted")))
                }
                Some(SearchStep::Fail(msg)) => Err(SearchError::Backend(anyhow::anyhow!(msg))),
            }
        })
    }
}

/// Publisher that records every batch and accepts or rejects all of it.
#[derive(Default)]
pub struct FakePublisher {
    published: Mutex<Vec<BusEvent>>,
    keys_seen: Mutex<Vec<Option<String>>>,
    reject: bool,
    fail: bool,
}

impl FakePublisher {
    /// Transport failure on every call.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Call succeeds but the bus rejects every entry.
    pub fn rejecting() -> Self {
        Self { reject: true, ..Self::default() }
    }

    pub async fn published(&self) -> Vec<BusEvent> {
        self.published.lock().await.clone()
    }

    pub async fn keys_seen(&self) -> Vec<Option<String>> {
        self.keys_seen.lock().await.clone()
    }
}

impl EventPublisher for FakePublisher {
    fn publish<'a>(
        &'a self,
        events: &'a [BusEvent],
        credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, anyhow::Result<PublishReceipt>> {
        Box::pin(async move {
            self.keys_seen.lock().await.push(credential.map(|c| c.access_key_id.clone()));
            if self.fail {
                anyhow::bail!("bus unreachable");
            }
            let mut published = self.published.lock().await;
            let mut receipt = PublishReceipt::default();
            for event in events {
                if self.reject {
                    receipt.failures.push(("AccessDenied".to_owned(), event.detail_type.clone()));
                } else {
                    published.push(event.clone());
                    receipt.event_ids.push(format!("evt-{}", published.len()));
                }
            }
            Ok(receipt)
        })
    }
}

/// Parameter store backed by a name → value map.
#[derive(Default)]
pub struct FakeParameterStore {
    values: HashMap<String, String>,
    fail_secret_batch: bool,
    calls: Mutex<Vec<(Vec<String>, bool)>>,
}

impl FakeParameterStore {
    pub fn new<K: Into<String>, V: Into<String>>(values: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Self::default()
        }
    }

    /// The decrypting batch fails with a backend error.
    pub fn failing_secrets(mut self) -> Self {
        self.fail_secret_batch = true;
        self
    }

    /// `(names, with_decryption)` for every call, in order.
    pub async fn calls(&self) -> Vec<(Vec<String>, bool)> {
        self.calls.lock().await.clone()
    }
}

impl ParameterStore for FakeParameterStore {
    fn fetch<'a>(
        &'a self,
        names: &'a [String],
        with_decryption: bool,
        _credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, anyhow::Result<HashMap<String, String>>> {
        Box::pin(async move {
            self.calls.lock().await.push((names.to_vec(), with_decryption));
            if with_decryption && self.fail_secret_batch {
                anyhow::bail!("kms decrypt denied");
            }
            Ok(names
                .iter()
                .filter_map(|n| self.values.get(n).map(|v| (n.clone(), v.clone())))
                .collect())
        })
    }
}
