// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eventprobe: integration-test harness for event-driven AWS services.
//!
//! Fetches parameters, exchanges delegated credentials, publishes events
//! and verifies their downstream effect by polling a searchable log.

pub mod aws;
pub mod config;
pub mod credential;
pub mod error;
pub mod http_retry;
pub mod params;
pub mod poll;
pub mod publish;
pub mod redact;
pub mod session;
pub mod signing;
pub mod test_support;

use std::future::Future;
use std::pin::Pin;

pub use crate::config::ProbeConfig;
pub use crate::error::{ErrorCode, ProbeError};
pub use crate::session::ProbeSession;

/// Boxed future returned by collaborator traits so they stay object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
