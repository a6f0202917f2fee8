use crate::{GIT_COMMIT_HASH, cognito::UserPool, token::IdTokenVerifier};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    /// "ok" when a client secret is configured, "missing" for public clients.
    secret_hash: String,
    /// "ok" when deployment credentials for admin commands are configured.
    admin_credentials: String,
    /// JWKS dependency: "ok", "error", "static", or "disabled".
    token_verifier: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gateway is healthy", body = Health),
        (status = 503, description = "JWKS endpoint is unreachable", body = Health)
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(
    method: Method,
    pool: Extension<Arc<UserPool>>,
    verifier: Extension<Arc<IdTokenVerifier>>,
) -> impl IntoResponse {
    let verifier_status = verifier.dependency_status().await;
    // The only remote dependency checked here is the JWKS endpoint; the
    // provider has no ping command and probing it would mutate rate limits.
    let is_healthy = verifier_status != "error";

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        secret_hash: if pool.has_client_secret() {
            "ok".to_string()
        } else {
            "missing".to_string()
        },
        admin_credentials: if pool.has_admin_credentials() {
            "ok".to_string()
        } else {
            "missing".to_string()
        },
        token_verifier: verifier_status.to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    if is_healthy {
        (StatusCode::OK, headers, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}
