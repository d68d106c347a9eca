// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use aws_config::SdkConfig;

use crate::aws::to_chrono;
use crate::credential::{CallerIdentity, DelegatedCredential, IdentityExchange, RoleRequest};
use crate::BoxFuture;

/// Identity exchange through STS `GetCallerIdentity` + `AssumeRole`.
pub struct StsExchange {
    client: aws_sdk_sts::Client,
}

impl StsExchange {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self { client: aws_sdk_sts::Client::new(sdk) }
    }
}

impl IdentityExchange for StsExchange {
    fn introspect(&self) -> BoxFuture<'_, anyhow::Result<CallerIdentity>> {
        Box::pin(async move {
            let out = self.client.get_caller_identity().send().await?;
            let account_id = out
                .account()
                .ok_or_else(|| anyhow::anyhow!("caller identity has no account"))?
                .to_owned();
            Ok(CallerIdentity { account_id })
        })
    }

    fn exchange<'a>(
        &'a self,
        request: &'a RoleRequest,
    ) -> BoxFuture<'a, anyhow::Result<DelegatedCredential>> {
        Box::pin(async move {
            let duration = i32::try_from(request.duration.as_secs())?;
            let out = self
                .client
                .assume_role()
                .role_arn(&request.role_arn)
                .role_session_name(&request.session_name)
                .duration_seconds(duration)
                .send()
                .await?;

            let creds = out
                .credentials()
                .ok_or_else(|| anyhow::anyhow!("failed to assume role {}", request.role_arn))?;
            let expiration = to_chrono(creds.expiration())
                .ok_or_else(|| anyhow::anyhow!("credential expiration out of range"))?;

            Ok(DelegatedCredential {
                access_key_id: creds.access_key_id().to_owned(),
                secret_access_key: creds.secret_access_key().to_owned(),
                session_token: creds.session_token().to_owned(),
                expiration,
            })
        })
    }
}
