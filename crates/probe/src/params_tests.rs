// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;
use crate::test_support::FakeParameterStore;

#[tokio::test]
async fn merges_secret_and_plain_batches() -> anyhow::Result<()> {
    let store = FakeParameterStore::new([("/a/Secret/Key", "foo"), ("/a/Other/Val", "bar")]);
    let specs = [
        ParameterSpec::secret("/a/Secret/Key"),
        ParameterSpec::plain("/a/Other/Val").local_name("customVal"),
    ];

    let params = fetch_parameters(&store, &specs, None).await;

    assert_eq!(params.len(), 2);
    assert_eq!(params.get("key"), Some("foo"));
    assert_eq!(params.get("customVal"), Some("bar"));
    assert_eq!(params.get("val"), None);

    let calls = store.calls().await;
    assert_eq!(
        calls,
        vec![
            (vec!["/a/Secret/Key".to_owned()], true),
            (vec!["/a/Other/Val".to_owned()], false),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_skipped() -> anyhow::Result<()> {
    let store = FakeParameterStore::new([("/Example-dev/NotASecret/Parameter", "x")]);
    let specs = [ParameterSpec::plain("/Example-dev/NotASecret/Parameter").local_name("myCustomName")];

    let params = fetch_parameters(&store, &specs, None).await;

    assert_eq!(params.get("myCustomName"), Some("x"));
    assert!(!params.contains("publicKey"));
    assert_eq!(store.calls().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_batch_leaves_keys_unset() -> anyhow::Result<()> {
    let store = FakeParameterStore::new([("/s/ApiKey", "k"), ("/p/Parameter", "v")]).failing_secrets();
    let specs = [ParameterSpec::secret("/s/ApiKey"), ParameterSpec::plain("/p/Parameter")];

    let params = fetch_parameters(&store, &specs, None).await;

    assert_eq!(params.get("apiKey"), None);
    assert_eq!(params.get("parameter"), Some("v"));
    Ok(())
}

#[tokio::test]
async fn missing_name_is_left_unset() -> anyhow::Result<()> {
    let store = FakeParameterStore::new([("/p/Present", "yes")]);
    let specs = [ParameterSpec::plain("/p/Present"), ParameterSpec::plain("/p/Absent")];

    let params = fetch_parameters(&store, &specs, None).await;

    assert_eq!(params.get("present"), Some("yes"));
    assert_eq!(params.get("absent"), None);
    Ok(())
}

#[tokio::test]
async fn require_reports_unfetched_key() -> anyhow::Result<()> {
    let store = FakeParameterStore::new([("/p/Present", "yes")]).failing_secrets();
    let specs = [ParameterSpec::plain("/p/Present"), ParameterSpec::secret("/s/Token")];

    let params = fetch_parameters(&store, &specs, None).await;

    assert_eq!(params.require("present")?, "yes");
    let err = params.require("token").err().ok_or_else(|| anyhow::anyhow!("expected error"))?;
    assert_eq!(err.code(), crate::error::ErrorCode::ParameterFetch);
    assert_eq!(err.code().exit_code(), 6);
    assert!(err.to_string().contains("\"token\""), "{err}");
    Ok(())
}

#[yare::parameterized(
    path          = { "/Example-dev/Secret/ApiKey", "apiKey" },
    lower_already = { "/a/b/value", "value" },
    no_slash      = { "Token", "token" },
    trailing      = { "/a/b/", "" },
    unicode       = { "/x/Ärger", "ärger" },
)]
fn local_name_derivation(name: &str, expected: &str) {
    assert_eq!(derive_local_name(name), expected);
}

#[yare::parameterized(
    plain        = { "/a/B", "/a/B", false, None },
    secret       = { "/a/B:secret", "/a/B", true, None },
    local        = { "/a/B=custom", "/a/B", false, Some("custom") },
    secret_local = { "/a/B:secret=custom", "/a/B", true, Some("custom") },
)]
fn parse_spec(input: &str, name: &str, secret: bool, local: Option<&str>) {
    let spec: ParameterSpec = input.parse().unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(spec.name, name);
    assert_eq!(spec.secret, secret);
    assert_eq!(spec.local_name.as_deref(), local);
}

#[yare::parameterized(
    empty_name  = { ":secret", "empty parameter name" },
    empty_local = { "/a/B=", "empty local name" },
)]
fn parse_spec_rejects(input: &str, expected: &str) {
    crate::assert_err_contains!(input.parse::<ParameterSpec>(), expected);
}

#[test]
fn explicit_local_name_is_verbatim() -> anyhow::Result<()> {
    let spec = ParameterSpec::plain("/a/Other/Val").local_name("CustomVal");
    assert_eq!(spec.key(), "CustomVal");
    Ok(())
}

proptest! {
    #[test]
    fn derived_name_is_last_segment(prefix in "(/[A-Za-z]{1,8}){0,4}", segment in "[A-Z][a-zA-Z0-9]{0,12}") {
        let name = format!("{prefix}/{segment}");
        let derived = derive_local_name(&name);
        prop_assert_eq!(derived.len(), segment.len());
        prop_assert!(derived.starts_with(|c: char| c.is_ascii_lowercase()));
        prop_assert_eq!(&derived[1..], &segment[1..]);
    }
}
