// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Shortest and longest session an assume-role exchange accepts.
const MIN_SESSION_SECS: u64 = 900;
const MAX_SESSION_SECS: u64 = 43_200;

/// Deployment tier the tests run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Development,
    Staging,
}

impl Tier {
    /// Map a free-form environment name onto a tier.
    ///
    /// `staging`, `accept` and `acceptance` select staging; anything else is
    /// development.
    pub fn from_environment(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "staging" | "accept" | "acceptance" => Self::Staging,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Staging => "Staging",
        }
    }

    /// Abbreviation used in resource names (`stg`, `dev`).
    pub fn short(&self) -> &'static str {
        match self {
            Self::Development => "dev",
            Self::Staging => "stg",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How backend calls are authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialMode {
    /// Local runs: use whatever the shared profile provides, no exchange.
    Ambient,
    /// CI runs: exchange the base identity for a short-lived role session.
    Delegated,
}

/// What the poller does when a search request is aborted by the transport.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AbortPolicy {
    /// Treat the abort as the deadline firing.
    #[default]
    Timeout,
    /// Keep polling until the deadline.
    Retry,
}

/// Configuration shared by the library and the `eventprobe` binary.
#[derive(Debug, Clone, clap::Args)]
pub struct ProbeConfig {
    /// Environment name; `staging`, `accept` or `acceptance` select the staging tier.
    #[arg(long, default_value = "development", env = "NODE_ENV")]
    pub environment: String,

    /// Running under CI: exchange credentials for the test execution role.
    #[arg(long, env = "CI")]
    pub ci: bool,

    /// AWS region for every backend.
    #[arg(long, default_value = "eu-west-1", env = "AWS_REGION")]
    pub region: String,

    /// Shared credentials profile used outside CI.
    #[arg(long, default_value = "default", env = "AWS_PROFILE")]
    pub profile: String,

    /// Leading segment of the execution role name.
    #[arg(long, default_value = "Example", env = "PROBE_ROLE_PREFIX")]
    pub role_prefix: String,

    /// Purpose segment of the execution role name.
    #[arg(long, default_value = "Test", env = "PROBE_ROLE_PURPOSE")]
    pub role_purpose: String,

    /// Lifetime requested for delegated credentials, in seconds.
    #[arg(long, default_value_t = 900, env = "PROBE_SESSION_DURATION_SECS")]
    pub session_duration_secs: u64,

    /// Delay before the first log search, in milliseconds.
    #[arg(long, default_value_t = 2000, env = "PROBE_INITIAL_DELAY_MS")]
    pub initial_delay_ms: u64,

    /// Delay between subsequent log searches, in milliseconds.
    #[arg(long, default_value_t = 1000, env = "PROBE_POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// How far before the requested start the search window opens, in milliseconds.
    #[arg(long, default_value_t = 2000, env = "PROBE_INGESTION_SKEW_MS")]
    pub ingestion_skew_ms: u64,

    /// Default upper bound on a single verification, in milliseconds.
    #[arg(long, default_value_t = 90_000, env = "PROBE_MAX_WAIT_MS")]
    pub max_wait_ms: u64,

    /// Handling of transport aborts during log search.
    #[arg(long, value_enum, default_value_t = AbortPolicy::Timeout, env = "PROBE_ABORT_POLICY")]
    pub abort_policy: AbortPolicy,

    /// `Source` attached to published events.
    #[arg(long, default_value = "Example.Integration.Tests", env = "PROBE_EVENT_SOURCE")]
    pub event_source: String,

    /// Event bus to publish to. Defaults to `aws/events/<prefix>-<tier>`.
    #[arg(long, env = "PROBE_EVENT_BUS")]
    pub event_bus: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_owned(),
            ci: false,
            region: "eu-west-1".to_owned(),
            profile: "default".to_owned(),
            role_prefix: "Example".to_owned(),
            role_purpose: "Test".to_owned(),
            session_duration_secs: MIN_SESSION_SECS,
            initial_delay_ms: 2000,
            poll_interval_ms: 1000,
            ingestion_skew_ms: 2000,
            max_wait_ms: 90_000,
            abort_policy: AbortPolicy::Timeout,
            event_source: "Example.Integration.Tests".to_owned(),
            event_bus: None,
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::Config("--poll-interval-ms must be non-zero".to_owned()));
        }
        if !(MIN_SESSION_SECS..=MAX_SESSION_SECS).contains(&self.session_duration_secs) {
            return Err(ProbeError::Config(format!(
                "--session-duration-secs must be within {MIN_SESSION_SECS}..={MAX_SESSION_SECS}"
            )));
        }
        if self.role_prefix.trim().is_empty() || self.role_purpose.trim().is_empty() {
            return Err(ProbeError::Config("role prefix and purpose must be non-empty".to_owned()));
        }
        Ok(())
    }

    pub fn tier(&self) -> Tier {
        Tier::from_environment(&self.environment)
    }

    pub fn credential_mode(&self) -> CredentialMode {
        if self.ci {
            CredentialMode::Delegated
        } else {
            CredentialMode::Ambient
        }
    }

    /// Role name (without account) assumed in delegated mode.
    pub fn role_name(&self) -> String {
        format!("{}-{}-{}-ExecutionRole", self.role_prefix, self.tier(), self.role_purpose)
    }

    pub fn event_bus(&self) -> String {
        match self.event_bus {
            Some(ref bus) => bus.clone(),
            None => format!("aws/events/{}-{}", self.role_prefix, self.tier().short()),
        }
    }

    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ingestion_skew(&self) -> Duration {
        Duration::from_millis(self.ingestion_skew_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
