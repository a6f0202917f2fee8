//! Identity token handling.
//!
//! Claim extraction is deliberately forgiving: the id token was just handed
//! to us by the provider (or by a caller we do not trust), and a token we
//! cannot read simply means "no claims available". Nothing in here panics or
//! surfaces an error for a malformed token.
//!
//! Verification ([`verify::IdTokenVerifier`]) is the strict counterpart:
//! RS256 signature against the pool's published JWKS plus issuer, audience,
//! token-use and expiry checks. The original application skipped this
//! entirely; here it is on by default and only disabled explicitly.

pub mod verify;

pub use verify::IdTokenVerifier;

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a json object")]
    PayloadType,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("unknown key id: {0}")]
    UnknownKid(String),
    #[error("failed to build verification key")]
    Rsa(#[from] rsa::errors::Error),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("invalid audience")]
    InvalidAudience,
    #[error("not an id token")]
    InvalidTokenUse,
    #[error("jwks fetch failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Claims projected out of an id token for the frontend.
///
/// A direct, lossless projection: absent claims stay `None`/empty, unknown
/// claims are simply not projected. Use [`claims`] for the raw payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserInfo {
    pub subject: Option<String>,
    pub email: Option<String>,
    pub groups: Vec<String>,
    pub roles: Vec<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email_verified: Option<bool>,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

/// Decode the payload segment of a three-segment token, without verifying
/// anything. `None` means "no claims available" and callers must treat it as
/// an unknown user, never as a crash.
#[must_use]
pub fn claims(token: &str) -> Option<Map<String, Value>> {
    match decode_claims(token) {
        Ok(claims) => Some(claims),
        Err(err) => {
            debug!("token claims unavailable: {err}");
            None
        }
    }
}

/// Project the well-known user claims out of an id token.
///
/// Group and role lists come from the provider-scoped claims
/// (`cognito:groups`, `cognito:roles`) and default to empty.
#[must_use]
pub fn user_info(token: &str) -> Option<UserInfo> {
    let claims = claims(token)?;

    Some(UserInfo {
        subject: string_claim(&claims, "sub"),
        email: string_claim(&claims, "email"),
        groups: list_claim(&claims, "cognito:groups"),
        roles: list_claim(&claims, "cognito:roles"),
        given_name: string_claim(&claims, "given_name"),
        family_name: string_claim(&claims, "family_name"),
        email_verified: bool_claim(&claims, "email_verified"),
        issued_at: int_claim(&claims, "iat"),
        expires_at: int_claim(&claims, "exp"),
    })
}

pub(crate) fn decode_claims(token: &str) -> Result<Map<String, Value>, Error> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::TokenFormat);
    }

    match decode_segment(parts[1])? {
        Value::Object(claims) => Ok(claims),
        _ => Err(Error::PayloadType),
    }
}

/// Base64url-decode one token segment into JSON. Padding is tolerated; the
/// URL-safe alphabet is the one the provider emits.
pub(crate) fn decode_segment(segment: &str) -> Result<Value, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(segment.trim_end_matches('='))
        .map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn string_claim(claims: &Map<String, Value>, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(str::to_string)
}

fn bool_claim(claims: &Map<String, Value>, name: &str) -> Option<bool> {
    match claims.get(name) {
        Some(Value::Bool(flag)) => Some(*flag),
        // some pools send attribute-style "true"/"false" strings
        Some(Value::String(text)) => text.parse().ok(),
        _ => None,
    }
}

fn int_claim(claims: &Map<String, Value>, name: &str) -> Option<i64> {
    claims.get(name).and_then(Value::as_i64)
}

fn list_claim(claims: &Map<String, Value>, name: &str) -> Vec<String> {
    claims
        .get(name)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode_segment(value: &Value) -> String {
        Base64UrlUnpadded::encode_string(value.to_string().as_bytes())
    }

    fn token_with_payload(payload: &Value) -> String {
        let header = encode_segment(&json!({"alg": "RS256", "typ": "JWT"}));
        format!("{header}.{}.c2lnbmF0dXJl", encode_segment(payload))
    }

    #[test]
    fn claims_round_trip_known_payload() {
        let token = token_with_payload(&json!({
            "sub": "u1",
            "email": "a@b.com",
            "cognito:groups": ["Admins"]
        }));
        let claims = claims(&token);
        let subject = claims
            .as_ref()
            .and_then(|c| c.get("sub"))
            .and_then(Value::as_str);
        assert_eq!(subject, Some("u1"));
    }

    #[test]
    fn user_info_projects_known_payload() {
        let token = token_with_payload(&json!({
            "sub": "u1",
            "email": "a@b.com",
            "cognito:groups": ["Admins"]
        }));
        let info = user_info(&token).unwrap_or_default();
        assert_eq!(info.subject.as_deref(), Some("u1"));
        assert_eq!(info.email.as_deref(), Some("a@b.com"));
        assert_eq!(info.groups, vec!["Admins".to_string()]);
        assert!(info.roles.is_empty());
        assert!(info.given_name.is_none());
    }

    #[test]
    fn user_info_projects_full_payload() {
        let token = token_with_payload(&json!({
            "sub": "u2",
            "email": "b@c.com",
            "email_verified": true,
            "given_name": "Grace",
            "family_name": "Hopper",
            "cognito:groups": ["Admins", "Operators"],
            "cognito:roles": ["arn:aws:iam::123:role/admin"],
            "iat": 1_700_000_000,
            "exp": 1_700_003_600
        }));
        let info = user_info(&token).unwrap_or_default();
        assert_eq!(info.groups.len(), 2);
        assert_eq!(info.roles.len(), 1);
        assert_eq!(info.email_verified, Some(true));
        assert_eq!(info.given_name.as_deref(), Some("Grace"));
        assert_eq!(info.family_name.as_deref(), Some("Hopper"));
        assert_eq!(info.issued_at, Some(1_700_000_000));
        assert_eq!(info.expires_at, Some(1_700_003_600));
    }

    #[test]
    fn no_dots_means_no_claims() {
        assert!(claims("not-a-token").is_none());
        assert!(user_info("not-a-token").is_none());
    }

    #[test]
    fn wrong_segment_count_means_no_claims() {
        assert!(claims("a.b").is_none());
        assert!(claims("a.b.c.d").is_none());
        assert!(claims("").is_none());
    }

    #[test]
    fn invalid_base64_means_no_claims() {
        assert!(claims("head.@@not-base64@@.sig").is_none());
    }

    #[test]
    fn non_json_payload_means_no_claims() {
        let segment = Base64UrlUnpadded::encode_string(b"plain text");
        assert!(claims(&format!("head.{segment}.sig")).is_none());
    }

    #[test]
    fn non_object_payload_means_no_claims() {
        let segment = Base64UrlUnpadded::encode_string(b"[1,2,3]");
        assert!(claims(&format!("head.{segment}.sig")).is_none());
    }

    #[test]
    fn padded_segments_are_tolerated() {
        let payload = json!({"sub": "padded"});
        let mut segment = Base64UrlUnpadded::encode_string(payload.to_string().as_bytes());
        while segment.len() % 4 != 0 {
            segment.push('=');
        }
        let token = format!("head.{segment}.sig");
        let info = user_info(&token).unwrap_or_default();
        assert_eq!(info.subject.as_deref(), Some("padded"));
    }

    #[test]
    fn email_verified_accepts_string_form() {
        let token = token_with_payload(&json!({"email_verified": "true"}));
        let info = user_info(&token).unwrap_or_default();
        assert_eq!(info.email_verified, Some(true));
    }

    #[test]
    fn non_string_group_entries_are_skipped() {
        let token = token_with_payload(&json!({"cognito:groups": ["Admins", 42, null]}));
        let info = user_info(&token).unwrap_or_default();
        assert_eq!(info.groups, vec!["Admins".to_string()]);
    }
}
