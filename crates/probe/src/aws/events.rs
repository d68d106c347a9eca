// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use aws_config::SdkConfig;
use aws_sdk_eventbridge::primitives::DateTime as AwsDateTime;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use aws_sdk_eventbridge::Client;

use crate::aws::sdk_credentials;
use crate::credential::DelegatedCredential;
use crate::publish::{BusEvent, EventPublisher, PublishReceipt};
use crate::BoxFuture;

/// Publisher backed by EventBridge `PutEvents`.
pub struct EventBridgePublisher {
    sdk: SdkConfig,
    ambient: Client,
}

impl EventBridgePublisher {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self { sdk: sdk.clone(), ambient: Client::new(sdk) }
    }

    fn client(&self, credential: Option<&DelegatedCredential>) -> Client {
        match credential {
            Some(cred) => {
                let conf = aws_sdk_eventbridge::config::Builder::from(&self.sdk)
                    .credentials_provider(sdk_credentials(cred))
                    .build();
                Client::from_conf(conf)
            }
            None => self.ambient.clone(),
        }
    }
}

fn to_entry(event: &BusEvent) -> PutEventsRequestEntry {
    let mut entry = PutEventsRequestEntry::builder()
        .event_bus_name(&event.bus_name)
        .source(&event.source)
        .detail_type(&event.detail_type)
        .detail(&event.detail);
    if let Some(time) = event.time {
        entry = entry.time(AwsDateTime::from_millis(time.timestamp_millis()));
    }
    for resource in &event.resources {
        entry = entry.resources(resource);
    }
    entry.build()
}

impl EventPublisher for EventBridgePublisher {
    fn publish<'a>(
        &'a self,
        events: &'a [BusEvent],
        credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, anyhow::Result<PublishReceipt>> {
        Box::pin(async move {
            let entries: Vec<PutEventsRequestEntry> = events.iter().map(to_entry).collect();
            let out = self
                .client(credential)
                .put_events()
                .set_entries(Some(entries))
                .send()
                .await?;

            let mut receipt = PublishReceipt::default();
            for result in out.entries() {
                match result.event_id() {
                    Some(id) => receipt.event_ids.push(id.to_owned()),
                    None => receipt.failures.push((
                        result.error_code().unwrap_or("Unknown").to_owned(),
                        result.error_message().unwrap_or_default().to_owned(),
                    )),
                }
            }
            Ok(receipt)
        })
    }
}
