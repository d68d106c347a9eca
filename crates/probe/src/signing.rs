// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HMAC-SHA256 request signatures.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::hmac;

use crate::error::ProbeError;

/// How the signing key string is turned into key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// UTF-8 bytes of the key string.
    Utf8,
    /// Hex digits packed into bytes; an odd-length key is padded with `0`.
    Hex,
}

/// Sign `payload` and return the base64 encoded tag.
///
/// With `double_base64` the base64 text is itself base64 encoded, which some
/// partner APIs expect.
pub fn hmac_signature(
    payload: &str,
    key: &str,
    encoding: KeyEncoding,
    double_base64: bool,
) -> Result<String, ProbeError> {
    if key.is_empty() {
        return Err(ProbeError::Config("HMAC key not found".to_owned()));
    }

    let key_bytes = match encoding {
        KeyEncoding::Utf8 => key.as_bytes().to_vec(),
        KeyEncoding::Hex => pack_hex(key)?,
    };

    let key = hmac::Key::new(hmac::HMAC_SHA256, &key_bytes);
    let tag = hmac::sign(&key, payload.as_bytes());
    let encoded = BASE64.encode(tag.as_ref());
    if double_base64 {
        Ok(BASE64.encode(encoded.as_bytes()))
    } else {
        Ok(encoded)
    }
}

/// Pack a hex string into bytes, padding an odd trailing nibble with `0`.
pub fn pack_hex(hex: &str) -> Result<Vec<u8>, ProbeError> {
    let mut digits: Vec<u8> = hex
        .chars()
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| ProbeError::Signing(format!("invalid hex digit {c:?} in key")))
        })
        .collect::<Result<_, _>>()?;
    if digits.len() % 2 == 1 {
        digits.push(0);
    }
    Ok(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

#[cfg(test)]
#[path = "signing_tests.rs"]
mod tests;
