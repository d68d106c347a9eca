// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-scoped client that owns the credential broker and the poller and
//! routes publish, verify and parameter calls through them.

use std::sync::Arc;

use serde::Serialize;

use crate::aws;
use crate::config::ProbeConfig;
use crate::credential::broker::{BrokerConfig, CredentialBroker};
use crate::credential::{system_clock, Clock, DelegatedCredential, IdentityExchange};
use crate::error::ProbeError;
use crate::params::{self, ParameterMap, ParameterSpec, ParameterStore};
use crate::poll::poller::EventualConsistencyPoller;
use crate::poll::{LogSearch, PollRequest, PollSettings};
use crate::publish::{BusEvent, EventPublisher, PublishReceipt};

/// Collaborators a session talks to.
pub struct Backends {
    pub exchange: Arc<dyn IdentityExchange>,
    pub search: Arc<dyn LogSearch>,
    pub publisher: Arc<dyn EventPublisher>,
    pub params: Arc<dyn ParameterStore>,
    pub clock: Clock,
}

impl Backends {
    pub fn new(
        exchange: Arc<dyn IdentityExchange>,
        search: Arc<dyn LogSearch>,
        publisher: Arc<dyn EventPublisher>,
        params: Arc<dyn ParameterStore>,
    ) -> Self {
        Self { exchange, search, publisher, params, clock: system_clock() }
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

/// One test session's view of the event-driven system under test.
pub struct ProbeSession {
    config: ProbeConfig,
    broker: CredentialBroker,
    poller: EventualConsistencyPoller,
    publisher: Arc<dyn EventPublisher>,
    params: Arc<dyn ParameterStore>,
}

impl ProbeSession {
    pub fn new(config: ProbeConfig, backends: Backends) -> Result<Self, ProbeError> {
        config.validate()?;
        let broker = CredentialBroker::with_clock(
            BrokerConfig::from(&config),
            backends.exchange,
            backends.clock,
        );
        let poller = EventualConsistencyPoller::new(backends.search, PollSettings::from(&config));
        Ok(Self {
            config,
            broker,
            poller,
            publisher: backends.publisher,
            params: backends.params,
        })
    }

    /// Build a session against the real AWS services.
    pub async fn connect(config: ProbeConfig) -> Result<Self, ProbeError> {
        config.validate()?;
        let sdk = aws::load_sdk_config(&config).await;
        tracing::debug!(
            region = %config.region,
            tier = %config.tier(),
            mode = ?config.credential_mode(),
            "aws configuration loaded"
        );
        let backends = Backends::new(
            Arc::new(aws::StsExchange::new(&sdk)),
            Arc::new(aws::CloudWatchSearch::new(&sdk)),
            Arc::new(aws::EventBridgePublisher::new(&sdk)),
            Arc::new(aws::SsmParameterStore::new(&sdk)),
        );
        Self::new(config, backends)
    }

    /// Current delegated credential, or `None` in ambient mode.
    pub async fn credentials(&self) -> Result<Option<DelegatedCredential>, ProbeError> {
        self.broker.get_credential().await
    }

    /// Fetch parameters; failures leave the affected keys unset.
    pub async fn fetch_parameters(
        &self,
        specs: &[ParameterSpec],
    ) -> Result<ParameterMap, ProbeError> {
        let credential = self.broker.get_credential().await?;
        Ok(params::fetch_parameters(self.params.as_ref(), specs, credential.as_ref()).await)
    }

    /// Publish `payload` as one `event_type` event on `bus`, or on the
    /// configured default bus.
    pub async fn publish_event<T: Serialize>(
        &self,
        event_type: &str,
        payload: &T,
        bus: Option<&str>,
    ) -> Result<PublishReceipt, ProbeError> {
        let bus = match bus {
            Some(bus) => bus.to_owned(),
            None => self.config.event_bus(),
        };
        let event = BusEvent::new(bus, self.config.event_source.clone(), event_type, payload)
            .map_err(|e| ProbeError::Publish(e.into()))?;
        self.publish_entries(vec![event]).await
    }

    /// Publish caller-built entries as one batch.
    ///
    /// Entries the bus rejects turn the whole call into a publish error.
    pub async fn publish_entries(
        &self,
        events: Vec<BusEvent>,
    ) -> Result<PublishReceipt, ProbeError> {
        let credential = self.broker.get_credential().await?;
        let receipt = self.publisher.publish(&events, credential.as_ref()).await.map_err(|e| {
            tracing::error!(err = %e, "error putting events");
            ProbeError::Publish(e)
        })?;

        if receipt.failed_count() > 0 {
            let summary = receipt
                .failures
                .iter()
                .map(|(code, msg)| format!("{code}: {msg}"))
                .collect::<Vec<_>>()
                .join("; ");
            tracing::error!(failed = receipt.failed_count(), %summary, "bus rejected entries");
            return Err(ProbeError::Publish(anyhow::anyhow!(
                "{} of {} entries rejected: {summary}",
                receipt.failed_count(),
                events.len()
            )));
        }

        for event in &events {
            tracing::info!(bus = %event.bus_name, detail_type = %event.detail_type, "event published");
        }
        Ok(receipt)
    }

    /// Wait for the downstream record described by `request`.
    pub async fn await_event(&self, request: &PollRequest) -> Result<serde_json::Value, ProbeError> {
        let credential = self.broker.get_credential().await?;
        self.poller.await_match(request, credential.as_ref()).await
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
