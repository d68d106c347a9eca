// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential broker: caches one delegated credential and refreshes it
//! once it has expired.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::{CredentialMode, ProbeConfig};
use crate::credential::{
    role_arn, session_name, system_clock, Clock, DelegatedCredential, IdentityExchange,
    RoleRequest,
};
use crate::error::ProbeError;

/// Broker settings, taken from [`ProbeConfig`].
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub mode: CredentialMode,
    /// Role name without account, e.g. `Example-Development-Test-ExecutionRole`.
    pub role_name: String,
    pub session_duration: Duration,
}

impl From<&ProbeConfig> for BrokerConfig {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            mode: config.credential_mode(),
            role_name: config.role_name(),
            session_duration: config.session_duration(),
        }
    }
}

/// Owns the single cached credential for a session.
pub struct CredentialBroker {
    config: BrokerConfig,
    exchange: Arc<dyn IdentityExchange>,
    cached: RwLock<Option<Arc<DelegatedCredential>>>,
    clock: Clock,
}

impl CredentialBroker {
    pub fn new(config: BrokerConfig, exchange: Arc<dyn IdentityExchange>) -> Self {
        Self::with_clock(config, exchange, system_clock())
    }

    pub fn with_clock(
        config: BrokerConfig,
        exchange: Arc<dyn IdentityExchange>,
        clock: Clock,
    ) -> Self {
        Self { config, exchange, cached: RwLock::new(None), clock }
    }

    /// Return a currently valid credential, exchanging a new one if needed.
    ///
    /// Returns `None` in ambient mode; callers then rely on the SDK's own
    /// credential chain.
    pub async fn get_credential(&self) -> Result<Option<DelegatedCredential>, ProbeError> {
        if self.config.mode == CredentialMode::Ambient {
            return Ok(None);
        }

        let now = (self.clock)();
        let snapshot = self.cached.read().await.clone();
        if let Some(cred) = snapshot {
            if cred.is_valid_at(now) {
                return Ok(Some(cred.as_ref().clone()));
            }
            tracing::debug!(expired_at = %cred.expiration, "cached credential expired");
        }

        let fresh = Arc::new(self.refresh().await?);
        *self.cached.write().await = Some(Arc::clone(&fresh));
        Ok(Some(fresh.as_ref().clone()))
    }

    async fn refresh(&self) -> Result<DelegatedCredential, ProbeError> {
        let identity = self.exchange.introspect().await.map_err(|e| {
            tracing::error!(err = %e, "caller identity lookup failed");
            ProbeError::AuthExchange(e)
        })?;

        let request = RoleRequest {
            role_arn: role_arn(&identity.account_id, &self.config.role_name),
            session_name: session_name((self.clock)()),
            duration: self.config.session_duration,
        };

        let cred = self.exchange.exchange(&request).await.map_err(|e| {
            tracing::error!(role = %request.role_arn, err = %e, "assume role failed");
            ProbeError::AuthExchange(e)
        })?;

        tracing::info!(
            role = %request.role_arn,
            session = %request.session_name,
            expires_at = %cred.expiration,
            "delegated credential refreshed"
        );
        Ok(cred)
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
