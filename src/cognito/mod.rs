//! User-pool provider client.
//!
//! The provider speaks a JSON command protocol: every command is a `POST` to
//! the pool endpoint with an `X-Amz-Target` header naming the command and an
//! `application/x-amz-json-1.1` body. User-facing commands authenticate with
//! the app client id (plus a secret hash for confidential clients);
//! administrative commands are signed with AWS Signature V4 using deployment
//! credentials.
//!
//! The gateway adds no retry, backoff, or idempotency on top of the provider:
//! one command per call, first error wins.

pub mod client;
pub mod error;
pub mod secret_hash;
pub mod sigv4;
pub mod types;

pub use client::UserPool;
pub use error::Error;
