// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded polling loop: delay, deadline check, query, decide.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;

use crate::config::AbortPolicy;
use crate::credential::DelegatedCredential;
use crate::error::ProbeError;
use crate::poll::{LogRecord, LogSearch, PollRequest, PollSettings, SearchError, SearchQuery};

/// Waits for a single matching record to show up in a log backend.
pub struct EventualConsistencyPoller {
    search: Arc<dyn LogSearch>,
    settings: PollSettings,
}

impl EventualConsistencyPoller {
    pub fn new(search: Arc<dyn LogSearch>, settings: PollSettings) -> Self {
        Self { search, settings }
    }

    /// Poll until exactly one record matches, then return its decoded payload.
    ///
    /// The search window and the deadline are fixed when the call starts.
    /// Every query is preceded by a delay, so at least one query runs
    /// unless the first delay alone exceeds `max_wait`.
    pub async fn await_match(
        &self,
        request: &PollRequest,
        credential: Option<&DelegatedCredential>,
    ) -> Result<serde_json::Value, ProbeError> {
        let max_wait = request.max_wait.unwrap_or(self.settings.default_max_wait);
        let started = Instant::now();
        let deadline = started + max_wait;

        let query = SearchQuery {
            resource: request.resource.clone(),
            filter_pattern: request.filter_pattern.clone(),
            start: shift_back(request.since, self.settings.ingestion_skew),
            end: shift_forward(Utc::now(), max_wait),
        };

        tracing::info!(
            resource = %query.resource,
            filter = %query.filter_pattern,
            max_wait_ms = whole_millis(max_wait),
            "searching for event"
        );

        let mut delay = self.settings.initial_delay;
        let mut attempts: u32 = 0;
        loop {
            tokio::time::sleep(delay).await;
            delay = self.settings.poll_interval;

            if Instant::now() > deadline {
                tracing::warn!(resource = %query.resource, attempts, "max polling duration reached");
                return Err(ProbeError::Timeout {
                    waited: started.elapsed(),
                    reason: format!("no match after {attempts} searches"),
                });
            }

            attempts += 1;
            let records = match self.search.search(&query, credential).await {
                Ok(records) => records,
                Err(SearchError::Aborted(e)) => match self.settings.abort_policy {
                    AbortPolicy::Timeout => {
                        tracing::warn!(resource = %query.resource, err = %e, "search aborted");
                        return Err(ProbeError::Timeout {
                            waited: started.elapsed(),
                            reason: format!("search aborted: {e:#}"),
                        });
                    }
                    AbortPolicy::Retry => {
                        tracing::debug!(resource = %query.resource, err = %e, "search aborted, retrying");
                        continue;
                    }
                },
                Err(SearchError::Backend(e)) => {
                    tracing::error!(
                        resource = %query.resource,
                        filter = %query.filter_pattern,
                        err = %e,
                        "log search failed"
                    );
                    return Err(ProbeError::SearchBackend {
                        resource: query.resource.clone(),
                        filter_pattern: query.filter_pattern.clone(),
                        source: e,
                    });
                }
            };

            match records.as_slice() {
                [] => {
                    tracing::debug!(resource = %query.resource, attempts, "no match yet");
                }
                [record] => {
                    tracing::info!(resource = %query.resource, attempts, "event found");
                    return decode(record);
                }
                many => {
                    return Err(ProbeError::MultipleMatches {
                        resource: query.resource.clone(),
                        count: many.len(),
                    });
                }
            }
        }
    }
}

fn decode(record: &LogRecord) -> Result<serde_json::Value, ProbeError> {
    let message = record
        .message
        .as_deref()
        .ok_or_else(|| ProbeError::Decode("matched record has no message".to_owned()))?;
    serde_json::from_str(message).map_err(|e| ProbeError::Decode(e.to_string()))
}

fn shift_back(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|d| at.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn shift_forward(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(by)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Milliseconds in `d`, saturating at `u64::MAX`.
fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
