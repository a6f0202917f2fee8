//! API handlers and shared utilities.
//!
//! Every route follows the same boundary contract: a JSON body with the
//! route's required fields, answered with `{"success": true, ...}` or
//! `{"error": "..."}`. Missing input is rejected with 400 before any
//! provider command is sent; provider authorization denials map to 403 with
//! a permissions hint; everything else, including missing deployment
//! configuration, is a 500 with the underlying message.

pub mod auth;
pub mod debug;
pub mod health;
pub mod root;

use crate::cognito::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde_json::json;

/// Hint returned with 403 when the provider reports that the deployment
/// credentials lack an administrative permission.
pub(crate) const PERMISSIONS_HINT: &str = "Provider permissions error: the deployment credentials are not allowed to run this administrative command; attach the user-pool administration policy to the deployment role";

/// Lightweight email sanity check used before sending signup commands.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Flat `{"error": ...}` body with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Map a provider client error onto the route boundary.
///
/// Configuration errors never reached the provider; they still surface as
/// 500 because the deployment, not the caller, is at fault.
pub(crate) fn provider_error_response(err: &Error) -> Response {
    match err {
        Error::AccessDenied(message) => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": PERMISSIONS_HINT,
                "details": message,
            })),
        )
            .into_response(),
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Trimmed, non-empty field value; `None` counts as missing.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .map(http_body_util::Collected::to_bytes)
            .unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap_or_default()
    }

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_at() {
        assert!(!valid_email("user.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn non_empty_trims_and_filters() {
        assert_eq!(non_empty(Some("  alice  ")), Some("alice"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[tokio::test]
    async fn error_response_shape() {
        let response = error_response(StatusCode::BAD_REQUEST, "Username is required");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body.get("error").and_then(serde_json::Value::as_str),
            Some("Username is required")
        );
    }

    #[tokio::test]
    async fn access_denied_maps_to_forbidden_with_hint() {
        let err = Error::AccessDenied(
            "User: arn:aws:iam::123:user/ci is not authorized to perform: cognito-idp:ListGroups"
                .to_string(),
        );
        let response = provider_error_response(&err);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(
            body.get("error").and_then(serde_json::Value::as_str),
            Some(PERMISSIONS_HINT)
        );
        assert!(body.get("details").is_some());
    }

    #[tokio::test]
    async fn configuration_errors_map_to_internal() {
        let response = provider_error_response(&Error::MissingCredentials);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = provider_error_response(&Error::MissingClientSecret);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn provider_errors_pass_message_through() {
        let err = Error::Provider {
            kind: "NotAuthorizedException".to_string(),
            message: "Incorrect username or password.".to_string(),
        };
        let response = provider_error_response(&err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(
            body.get("error").and_then(serde_json::Value::as_str),
            Some("Incorrect username or password.")
        );
    }
}
