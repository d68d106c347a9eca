// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter store access: batched fetch of secret and plain values merged
//! into one map keyed by local names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::credential::DelegatedCredential;
use crate::error::ProbeError;
use crate::BoxFuture;

/// A parameter to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Full store path, e.g. `/Example-dev/Secret/ApiKey`.
    pub name: String,
    /// Fetched with decryption.
    #[serde(default)]
    pub secret: bool,
    /// Key in the result map. Derived from `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
}

impl ParameterSpec {
    pub fn plain(name: impl Into<String>) -> Self {
        Self { name: name.into(), secret: false, local_name: None }
    }

    pub fn secret(name: impl Into<String>) -> Self {
        Self { name: name.into(), secret: true, local_name: None }
    }

    pub fn local_name(mut self, local: impl Into<String>) -> Self {
        self.local_name = Some(local.into());
        self
    }

    /// Key this parameter is stored under in a [`ParameterMap`].
    pub fn key(&self) -> String {
        match self.local_name {
            Some(ref local) => local.clone(),
            None => derive_local_name(&self.name),
        }
    }
}

impl std::str::FromStr for ParameterSpec {
    type Err = anyhow::Error;

    /// Parse `name[:secret][=local]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (head, local) = match s.split_once('=') {
            Some((head, local)) if !local.is_empty() => (head, Some(local.to_owned())),
            Some(_) => anyhow::bail!("empty local name in {s:?}"),
            None => (s, None),
        };
        let (name, secret) = match head.strip_suffix(":secret") {
            Some(name) => (name, true),
            None => (head, false),
        };
        if name.is_empty() {
            anyhow::bail!("empty parameter name in {s:?}");
        }
        Ok(Self { name: name.to_owned(), secret, local_name: local })
    }
}

/// Last path segment of `name` with its first character lower-cased.
pub fn derive_local_name(name: &str) -> String {
    let segment = name.rsplit('/').next().unwrap_or(name);
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fetched parameters. Unknown or unfetched keys read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap {
    values: HashMap<String, String>,
}

impl ParameterMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value for `key`, or a parameter-fetch error naming it.
    pub fn require(&self, key: &str) -> Result<&str, ProbeError> {
        self.get(key)
            .ok_or_else(|| ProbeError::ParameterFetch(anyhow::anyhow!("parameter {key:?} not fetched")))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn extend(&mut self, other: ParameterMap) {
        self.values.extend(other.values);
    }
}

/// Remote key-value store.
///
/// Decryption mode applies to the whole request, so callers batch secret
/// and plain names separately. The returned map is keyed by full name and
/// omits names the store does not know.
pub trait ParameterStore: Send + Sync {
    fn fetch<'a>(
        &'a self,
        names: &'a [String],
        with_decryption: bool,
        credential: Option<&'a DelegatedCredential>,
    ) -> BoxFuture<'a, anyhow::Result<HashMap<String, String>>>;
}

/// Fetch `specs` in a secret batch and a plain batch and merge the results.
///
/// A failed batch is logged and leaves its keys unset; so does a name the
/// store reports as missing.
pub async fn fetch_parameters(
    store: &dyn ParameterStore,
    specs: &[ParameterSpec],
    credential: Option<&DelegatedCredential>,
) -> ParameterMap {
    let mut merged = fetch_batch(store, specs, true, credential).await;
    merged.extend(fetch_batch(store, specs, false, credential).await);
    merged
}

async fn fetch_batch(
    store: &dyn ParameterStore,
    specs: &[ParameterSpec],
    with_decryption: bool,
    credential: Option<&DelegatedCredential>,
) -> ParameterMap {
    let batch: Vec<&ParameterSpec> = specs.iter().filter(|p| p.secret == with_decryption).collect();
    let mut out = ParameterMap::default();
    if batch.is_empty() {
        return out;
    }

    let names: Vec<String> = batch.iter().map(|p| p.name.clone()).collect();
    let fetched = match store.fetch(&names, with_decryption, credential).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::warn!(with_decryption, names = ?names, err = %e, "parameter fetch failed");
            return out;
        }
    };

    for spec in batch {
        match fetched.get(&spec.name) {
            Some(value) => out.insert(spec.key(), value.clone()),
            None => tracing::warn!(name = %spec.name, "parameter not found"),
        }
    }
    out
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
