// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable error codes for every failure the probe can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Config,
    AuthExchange,
    Timeout,
    MultipleMatches,
    SearchBackend,
    Publish,
    ParameterFetch,
    Decode,
    Signing,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "CONFIG",
            Self::AuthExchange => "AUTH_EXCHANGE",
            Self::Timeout => "TIMEOUT",
            Self::MultipleMatches => "MULTIPLE_MATCHES",
            Self::SearchBackend => "SEARCH_BACKEND",
            Self::Publish => "PUBLISH",
            Self::ParameterFetch => "PARAMETER_FETCH",
            Self::Decode => "DECODE",
            Self::Signing => "SIGNING",
        }
    }

    /// Process exit status used by the binary.
    ///
    /// "Nothing happened" (timeout) and "ambiguous evidence" get their own
    /// statuses so scripts can tell them apart from broken backends.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config => 2,
            Self::Timeout => 3,
            Self::MultipleMatches => 4,
            Self::AuthExchange => 5,
            Self::SearchBackend | Self::Publish | Self::ParameterFetch => 6,
            Self::Decode | Self::Signing => 7,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the credential broker, the poller and the
/// collaborator wrappers.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("credential exchange failed: {0:#}")]
    AuthExchange(#[source] anyhow::Error),

    #[error("no matching event within {waited:?}: {reason}")]
    Timeout { waited: Duration, reason: String },

    #[error("filter matched {count} events in {resource}, expected exactly one")]
    MultipleMatches { resource: String, count: usize },

    #[error("log search in {resource} for {filter_pattern:?} failed: {source:#}")]
    SearchBackend {
        resource: String,
        filter_pattern: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("publish failed: {0:#}")]
    Publish(#[source] anyhow::Error),

    #[error("parameter fetch failed: {0:#}")]
    ParameterFetch(#[source] anyhow::Error),

    #[error("matched event payload is not valid JSON: {0}")]
    Decode(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

impl ProbeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::Config,
            Self::AuthExchange(_) => ErrorCode::AuthExchange,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::MultipleMatches { .. } => ErrorCode::MultipleMatches,
            Self::SearchBackend { .. } => ErrorCode::SearchBackend,
            Self::Publish(_) => ErrorCode::Publish,
            Self::ParameterFetch(_) => ErrorCode::ParameterFetch,
            Self::Decode(_) => ErrorCode::Decode,
            Self::Signing(_) => ErrorCode::Signing,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
