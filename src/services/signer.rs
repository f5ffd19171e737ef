//! Request signing for Alibaba Cloud.
//!
//! Two schemes are used, both built on HMAC-SHA256:
//!
//! - **OSS V4** (`OSS4-HMAC-SHA256`) for object storage requests
//! - **OpenAPI V3** (`ACS3-HMAC-SHA256`) for RPC-style services such as ECS and RAM

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const OSS_V4_ALGORITHM: &str = "OSS4-HMAC-SHA256";
pub const ACS3_ALGORITHM: &str = "ACS3-HMAC-SHA256";
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// AccessKey pair used to sign every request.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// Percent-encode per RFC 3986, keeping only unreserved characters.
///
/// `/` is kept as is when `keep_slash` is set (object keys in OSS paths).
pub fn percent_encode(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

/// Hex encoded SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key length is valid");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Sorted `key=value` pairs joined with `&`, both sides percent-encoded.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k, false), percent_encode(v, false)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `x-oss-date` header value.
pub fn oss_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// `x-acs-date` header value.
pub fn acs_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Build the `Authorization` header for an OSS V4 request.
///
/// `headers` must use lowercase names. Only `content-type`, `content-md5`
/// and `x-oss-*` take part in the signature, so `host` and `content-length`
/// may be passed without affecting it. The `x-oss-date` header must be
/// present and match `now`.
pub fn oss_v4_authorization(
    credentials: &Credentials,
    region: &str,
    method: &str,
    canonical_uri: &str,
    headers: &BTreeMap<String, String>,
    now: DateTime<Utc>,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .filter(|(name, _)| {
            name.as_str() == "content-type"
                || name.as_str() == "content-md5"
                || name.starts_with("x-oss-")
        })
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    let canonical_request = format!(
        "{}\n{}\n\n{}\n\n{}",
        method, canonical_uri, canonical_headers, UNSIGNED_PAYLOAD
    );

    let date = now.format("%Y%m%d").to_string();
    let scope = format!("{}/{}/oss/aliyun_v4_request", date, region);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        OSS_V4_ALGORITHM,
        oss_timestamp(now),
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    // Key derivation chain: secret -> date -> region -> service -> request
    let key = format!("aliyun_v4{}", credentials.access_key_secret);
    let key = hmac_sha256(key.as_bytes(), &date);
    let key = hmac_sha256(&key, region);
    let key = hmac_sha256(&key, "oss");
    let key = hmac_sha256(&key, "aliyun_v4_request");
    let signature = hex::encode(hmac_sha256(&key, &string_to_sign));

    format!(
        "{} Credential={}/{},Signature={}",
        OSS_V4_ALGORITHM, credentials.access_key_id, scope, signature
    )
}

/// Build the `Authorization` header for an OpenAPI V3 request.
///
/// Every entry of `headers` is signed, so callers pass exactly `host` and
/// the `x-acs-*` headers, with lowercase names.
pub fn acs3_authorization(
    credentials: &Credentials,
    method: &str,
    canonical_query: &str,
    headers: &BTreeMap<String, String>,
    hashed_payload: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();
    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

    let canonical_request = format!(
        "{}\n/\n{}\n{}\n{}\n{}",
        method, canonical_query, canonical_headers, signed_headers, hashed_payload
    );
    let string_to_sign = format!(
        "{}\n{}",
        ACS3_ALGORITHM,
        sha256_hex(canonical_request.as_bytes())
    );
    let signature = hex::encode(hmac_sha256(
        credentials.access_key_secret.as_bytes(),
        &string_to_sign,
    ));

    format!(
        "{} Credential={},SignedHeaders={},Signature={}",
        ACS3_ALGORITHM, credentials.access_key_id, signed_headers, signature
    )
}
