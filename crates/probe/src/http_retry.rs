// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resend an HTTP request when the response status is on a retry list.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};

/// When and how often to resend.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_on: Vec<StatusCode>,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_on: vec![StatusCode::GATEWAY_TIMEOUT],
            delay: Duration::from_secs(5),
        }
    }
}

/// Send `request`, resending up to `policy.max_retries` times while the
/// status is in `policy.retry_on`. The last response is returned as-is,
/// whatever its status.
pub async fn send_with_retry(
    request: RequestBuilder,
    policy: &RetryPolicy,
) -> anyhow::Result<Response> {
    let mut attempt = 0;
    loop {
        let attempt_request = request
            .try_clone()
            .ok_or_else(|| anyhow::anyhow!("request with a streaming body cannot be retried"))?;
        let resp = attempt_request.send().await?;

        if attempt < policy.max_retries && policy.retry_on.contains(&resp.status()) {
            tracing::info!(status = %resp.status(), url = %resp.url(), attempt, "retrying request");
            tokio::time::sleep(policy.delay).await;
            attempt += 1;
            continue;
        }
        return Ok(resp);
    }
}

#[cfg(test)]
#[path = "http_retry_tests.rs"]
mod tests;
