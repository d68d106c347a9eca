// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[yare::parameterized(
    config = { ProbeError::Config("x".to_owned()), ErrorCode::Config, 2 },
    timeout = { ProbeError::Timeout { waited: Duration::from_secs(1), reason: "r".to_owned() }, ErrorCode::Timeout, 3 },
    multiple = { ProbeError::MultipleMatches { resource: "/g".to_owned(), count: 2 }, ErrorCode::MultipleMatches, 4 },
    auth = { ProbeError::AuthExchange(anyhow::anyhow!("denied")), ErrorCode::AuthExchange, 5 },
    publish = { ProbeError::Publish(anyhow::anyhow!("down")), ErrorCode::Publish, 6 },
    parameter = { ProbeError::ParameterFetch(anyhow::anyhow!("missing")), ErrorCode::ParameterFetch, 6 },
    decode = { ProbeError::Decode("eof".to_owned()), ErrorCode::Decode, 7 },
    signing = { ProbeError::Signing("bad hex".to_owned()), ErrorCode::Signing, 7 },
)]
fn error_maps_to_code(err: ProbeError, code: ErrorCode, exit: i32) {
    assert_eq!(err.code(), code);
    assert_eq!(err.code().exit_code(), exit);
}

#[test]
fn search_backend_message_names_resource_and_filter() -> anyhow::Result<()> {
    let err = ProbeError::SearchBackend {
        resource: "/aws/events/bus".to_owned(),
        filter_pattern: "{ $.id = 1 }".to_owned(),
        source: anyhow::anyhow!("access denied"),
    };
    let msg = err.to_string();
    assert!(msg.contains("/aws/events/bus"), "{msg}");
    assert!(msg.contains("$.id = 1"), "{msg}");
    assert!(msg.contains("access denied"), "{msg}");
    assert_eq!(err.code().as_str(), "SEARCH_BACKEND");
    Ok(())
}

#[test]
fn only_timeout_is_timeout() -> anyhow::Result<()> {
    let t = ProbeError::Timeout { waited: Duration::ZERO, reason: "aborted".to_owned() };
    assert!(t.is_timeout());
    assert!(!ProbeError::Decode("x".to_owned()).is_timeout());
    Ok(())
}
