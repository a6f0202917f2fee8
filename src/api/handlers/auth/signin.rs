use crate::{
    api::handlers::{
        auth::{
            tokens_or_challenge,
            types::{ErrorResponse, SetNewPasswordRequest, SigninOk, SigninRequest},
        },
        error_response, non_empty, provider_error_response,
    },
    cognito::UserPool,
    token::IdTokenVerifier,
};
use axum::{Json, extract::Extension, http::StatusCode, response::Response};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Tokens issued, or a challenge relayed from the provider", body = SigninOk),
        (status = 400, description = "Username or password missing", body = ErrorResponse),
        (status = 500, description = "Provider rejected the credentials", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, verifier, payload))]
pub async fn signin(
    pool: Extension<Arc<UserPool>>,
    verifier: Extension<Arc<IdTokenVerifier>>,
    payload: Option<Json<SigninRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let (Some(username), Some(password)) = (
        non_empty(payload.username.as_deref()),
        non_empty(payload.password.as_deref()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Username and password are required");
    };

    match pool.initiate_auth(username, password).await {
        Ok(response) => tokens_or_challenge(username, response, &verifier).await,
        Err(err) => provider_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/set-new-password",
    request_body = SetNewPasswordRequest,
    responses(
        (status = 200, description = "Password accepted, tokens issued", body = SigninOk),
        (status = 400, description = "Username, new password or session missing", body = ErrorResponse),
        (status = 500, description = "Provider rejected the challenge response", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, verifier, payload))]
pub async fn set_new_password(
    pool: Extension<Arc<UserPool>>,
    verifier: Extension<Arc<IdTokenVerifier>>,
    payload: Option<Json<SetNewPasswordRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let (Some(username), Some(new_password), Some(session)) = (
        non_empty(payload.username.as_deref()),
        non_empty(payload.new_password.as_deref()),
        non_empty(payload.session.as_deref()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username, new password and session are required",
        );
    };

    match pool
        .respond_new_password(username, new_password, session)
        .await
    {
        Ok(response) => tokens_or_challenge(username, response, &verifier).await,
        Err(err) => provider_error_response(&err),
    }
}
