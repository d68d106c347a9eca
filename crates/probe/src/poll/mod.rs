// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eventual-consistency verification against a searchable log.

pub mod poller;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{AbortPolicy, ProbeConfig};
use crate::credential::DelegatedCredential;
use crate::BoxFuture;

/// One search over a fixed time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub resource: String,
    pub filter_pattern: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A record returned by the log backend. `message` is the raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub message: Option<String>,
}

impl LogRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()) }
    }
}

/// Failure modes of a log search.
#[derive(Debug)]
pub enum SearchError {
    /// The transport gave up on the request (timeout, abort).
    Aborted(anyhow::Error),
    /// Any other backend failure.
    Backend(anyhow::Error),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aborted(e) => write!(f, "aborted: {e:#}"),
            Self::Backend(e) => write!(f, "{e:#}"),
        }
    }
}

/// Log backend searched by the poller.
pub trait LogSearch: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a SearchQuery,
        credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, SearchError>>;
}

/// What to wait for.
#[derive(Debug, Clone)]
pub struct PollRequest {
    /// Earliest time the expected record can carry (before skew).
    pub since: DateTime<Utc>,
    pub filter_pattern: String,
    pub resource: String,
    /// Overrides [`PollSettings::default_max_wait`] when set.
    pub max_wait: Option<Duration>,
}

impl PollRequest {
    pub fn new(
        since: DateTime<Utc>,
        filter_pattern: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            since,
            filter_pattern: filter_pattern.into(),
            resource: resource.into(),
            max_wait: None,
        }
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

/// Polling schedule.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    pub ingestion_skew: Duration,
    pub default_max_wait: Duration,
    pub abort_policy: AbortPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            ingestion_skew: Duration::from_secs(2),
            default_max_wait: Duration::from_secs(90),
            abort_policy: AbortPolicy::Timeout,
        }
    }
}

impl From<&ProbeConfig> for PollSettings {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            initial_delay: config.initial_delay(),
            poll_interval: config.poll_interval(),
            ingestion_skew: config.ingestion_skew(),
            default_max_wait: config.max_wait(),
            abort_policy: config.abort_policy,
        }
    }
}
