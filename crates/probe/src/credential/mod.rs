// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delegated credentials: the cached value, the exchange seam, and the
//! broker that decides when to refresh.

pub mod broker;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BoxFuture;

/// Source of "now" for expiry decisions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Short-lived credential obtained by assuming the execution role.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedCredential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl DelegatedCredential {
    /// Usable strictly before its expiration.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiration
    }
}

impl fmt::Debug for DelegatedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedCredential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Result of introspecting the base identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: String,
}

/// Parameters of one role exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub duration: Duration,
}

/// Identity provider that can trade the base identity for a role session.
pub trait IdentityExchange: Send + Sync {
    fn introspect(&self) -> BoxFuture<'_, anyhow::Result<CallerIdentity>>;

    fn exchange<'a>(
        &'a self,
        request: &'a RoleRequest,
    ) -> BoxFuture<'a, anyhow::Result<DelegatedCredential>>;
}

/// Full ARN of `role_name` in `account_id`.
pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role_name}")
}

/// Session name derived from the exchange time, e.g.
/// `tests-execution-20260214T012345`.
pub fn session_name(at: DateTime<Utc>) -> String {
    format!("tests-execution-{}", at.format("%Y%m%dT%H%M%S"))
}
