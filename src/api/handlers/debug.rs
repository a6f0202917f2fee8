use crate::cognito::UserPool;
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

/// Fixed probe username so the derived tag can be checked against an
/// independent HMAC implementation.
const PROBE_USERNAME: &str = "testuser@example.com";

#[utoipa::path(
    get,
    path = "/api/debug/secret-hash",
    responses(
        (status = 200, description = "Derived tag for the probe username"),
        (status = 500, description = "Client secret is not configured"),
    ),
    tag = "debug"
)]
#[instrument(skip(pool))]
pub async fn secret_hash(pool: Extension<Arc<UserPool>>) -> Response {
    match pool.secret_hash(PROBE_USERNAME) {
        Ok(tag) => Json(json!({
            "message": "secret hash probe",
            "testUsername": PROBE_USERNAME,
            "clientId": pool.client_id(),
            "messageToHash": format!("{PROBE_USERNAME}{}", pool.client_id()),
            "secretHash": tag,
        }))
        .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": err.to_string(),
                "config": {
                    "userPoolId": pool.user_pool_id(),
                    "clientId": pool.client_id(),
                    "clientSecretExists": false,
                },
            })),
        )
            .into_response(),
    }
}
