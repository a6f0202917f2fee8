//! # Pordego (Identity Provider Gateway)
//!
//! `pordego` is a thin HTTP gateway in front of an Amazon-Cognito-compatible
//! user pool. Each route validates its input, issues exactly one provider
//! command, and reshapes the provider's answer into a flat JSON payload for
//! the frontend.
//!
//! ## What lives here, what doesn't
//!
//! Users, credentials, password policy, challenge state, and group membership
//! are owned entirely by the identity provider. The gateway holds no durable
//! state and adds no retry or idempotency layer; a request either completes
//! or fails with the provider's own message.
//!
//! Two pieces of real logic are implemented locally:
//!
//! - **Secret hash derivation** ([`cognito::secret_hash`]): confidential app
//!   clients must accompany username-bound commands with
//!   `base64(HMAC-SHA256(client_secret, username || client_id))`.
//! - **Identity token handling** ([`token`]): claim extraction from the id
//!   token payload, and RS256 verification against the pool's published JWKS
//!   (on by default, can be disabled for local emulators).
//!
//! ## Administrative commands
//!
//! Admin commands (`AdminCreateUser`, `ListGroups`, ...) are signed with AWS
//! Signature V4 using deployment credentials. When those credentials are not
//! configured, admin routes fail before any remote call is made.

pub mod api;
pub mod cli;
pub mod cognito;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
