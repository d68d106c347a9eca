// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message-bus publishing seam.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::DelegatedCredential;
use crate::BoxFuture;

/// One entry for the event bus. `detail` is already-encoded JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusEvent {
    pub bus_name: String,
    pub source: String,
    pub detail_type: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

impl BusEvent {
    /// Build an entry, encoding `payload` as JSON.
    pub fn new<T: Serialize>(
        bus_name: impl Into<String>,
        source: impl Into<String>,
        detail_type: impl Into<String>,
        payload: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            bus_name: bus_name.into(),
            source: source.into(),
            detail_type: detail_type.into(),
            detail: serde_json::to_string(payload)?,
            time: None,
            resources: vec![],
        })
    }
}

/// Outcome of a publish call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Bus-assigned ids of accepted entries.
    pub event_ids: Vec<String>,
    /// `(code, message)` for each rejected entry.
    pub failures: Vec<(String, String)>,
}

impl PublishReceipt {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}

/// Event bus client.
pub trait EventPublisher: Send + Sync {
    fn publish<'a>(
        &'a self,
        events: &'a [BusEvent],
        credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, anyhow::Result<PublishReceipt>>;
}
