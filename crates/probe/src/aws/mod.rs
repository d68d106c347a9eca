// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AWS-backed collaborators: STS, CloudWatch Logs, EventBridge and SSM.
//!
//! Every backend keeps the shared [`SdkConfig`] and builds a client per
//! call when a delegated credential is supplied, so the credential is
//! never retained past the call.

pub mod events;
pub mod logs;
pub mod ssm;
pub mod sts;

use std::time::SystemTime;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use chrono::{DateTime, Utc};

use crate::config::{CredentialMode, ProbeConfig};
use crate::credential::DelegatedCredential;

pub use events::EventBridgePublisher;
pub use logs::CloudWatchSearch;
pub use ssm::SsmParameterStore;
pub use sts::StsExchange;

/// Provider name attached to per-call static credentials.
const PROVIDER_NAME: &str = "eventprobe-delegated";

/// Load the shared SDK configuration.
///
/// Outside CI the named shared-credentials profile is used; in CI the
/// default chain supplies the base identity that STS exchanges.
pub async fn load_sdk_config(config: &ProbeConfig) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
    if config.credential_mode() == CredentialMode::Ambient {
        loader = loader.profile_name(&config.profile);
    }
    loader.load().await
}

/// Static SDK credentials for one call.
pub(crate) fn sdk_credentials(cred: &DelegatedCredential) -> aws_sdk_sts::config::Credentials {
    aws_sdk_sts::config::Credentials::new(
        cred.access_key_id.clone(),
        cred.secret_access_key.clone(),
        Some(cred.session_token.clone()),
        Some(SystemTime::from(cred.expiration)),
        PROVIDER_NAME,
    )
}

pub(crate) fn to_chrono(dt: &aws_sdk_sts::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
