//! Secret hash derivation for confidential app clients.
//!
//! The provider requires username-bound commands from confidential clients to
//! carry `base64(HMAC-SHA256(client_secret, username || client_id))`. The tag
//! is computed per request and discarded; it never persists anywhere.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Derive the secret hash for `username` under `client_id`.
///
/// Deterministic, no side effects. Callers that may be running without a
/// configured secret go through [`crate::cognito::UserPool::secret_hash`],
/// which turns the absent secret into a configuration error.
#[must_use]
pub fn derive(client_secret: &str, username: &str, client_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Base64::encode_string(&mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let first = derive("s3cr3t", "testuser@example.com", "abc123");
        let second = derive("s3cr3t", "testuser@example.com", "abc123");
        assert_eq!(first, second);
    }

    #[test]
    fn derive_matches_known_vector() {
        // base64(HMAC_SHA256("s3cr3t", "testuser@example.com" + "abc123"))
        let tag = derive("s3cr3t", "testuser@example.com", "abc123");
        assert_eq!(tag, "sYe0eeCm3MQC9Rnl4gblZIqzMk0Ry9ikijmPBACJWgA=");
    }

    #[test]
    fn derive_matches_rfc4231_case_2() {
        // HMAC-SHA256 test vector with a printable key: key "Jefe",
        // data "what do ya want for nothing?"
        let tag = derive("Jefe", "what do ya want ", "for nothing?");
        assert_eq!(tag, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn any_input_change_changes_the_tag() {
        let base = derive("s3cr3t", "testuser@example.com", "abc123");
        assert_ne!(base, derive("s3cr3u", "testuser@example.com", "abc123"));
        assert_ne!(base, derive("s3cr3t", "testuser@example.org", "abc123"));
        assert_ne!(base, derive("s3cr3t", "testuser@example.com", "abc124"));
    }

    #[test]
    fn concatenation_order_is_username_then_client_id() {
        // "ab" + "c" and "a" + "bc" concatenate to the same message
        assert_eq!(derive("key", "ab", "c"), derive("key", "a", "bc"));
    }
}
