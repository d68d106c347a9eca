// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt::Debug;

use aws_config::SdkConfig;
use aws_sdk_cloudwatchlogs::error::SdkError;
use aws_sdk_cloudwatchlogs::Client;

use crate::aws::sdk_credentials;
use crate::credential::DelegatedCredential;
use crate::poll::{LogRecord, LogSearch, SearchError, SearchQuery};
use crate::BoxFuture;

/// Log search through CloudWatch Logs `FilterLogEvents`.
pub struct CloudWatchSearch {
    sdk: SdkConfig,
    ambient: Client,
}

impl CloudWatchSearch {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self { sdk: sdk.clone(), ambient: Client::new(sdk) }
    }

    fn client(&self, credential: Option<&DelegatedCredential>) -> Client {
        match credential {
            Some(cred) => {
                let conf = aws_sdk_cloudwatchlogs::config::Builder::from(&self.sdk)
                    .credentials_provider(sdk_credentials(cred))
                    .build();
                Client::from_conf(conf)
            }
            None => self.ambient.clone(),
        }
    }
}

impl LogSearch for CloudWatchSearch {
    fn search<'a>(
        &'a self,
        query: &'a SearchQuery,
        credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, Result<Vec<LogRecord>, SearchError>> {
        Box::pin(async move {
            let client = self.client(credential);
            let mut records = Vec::new();
            let mut next_token: Option<String> = None;

            // One logical search may span several pages of the same window.
            loop {
                let out = client
                    .filter_log_events()
                    .log_group_name(&query.resource)
                    .filter_pattern(&query.filter_pattern)
                    .start_time(query.start.timestamp_millis())
                    .end_time(query.end.timestamp_millis())
                    .set_next_token(next_token.take())
                    .send()
                    .await
                    .map_err(classify)?;

                records.extend(
                    out.events()
                        .iter()
                        .map(|e| LogRecord { message: e.message().map(str::to_owned) }),
                );

                match out.next_token() {
                    Some(token) if !token.is_empty() => next_token = Some(token.to_owned()),
                    _ => break,
                }
            }
            Ok(records)
        })
    }
}

/// Transport timeouts are aborts; everything else is a backend failure.
fn classify<E, R>(err: SdkError<E, R>) -> SearchError
where
    E: std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    let aborted = match &err {
        SdkError::TimeoutError(_) => true,
        SdkError::DispatchFailure(failure) => failure.is_timeout(),
        _ => false,
    };
    if aborted {
        SearchError::Aborted(err.into())
    } else {
        SearchError::Backend(err.into())
    }
}
