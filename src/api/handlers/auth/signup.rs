use crate::{
    api::handlers::{
        auth::types::{Ack, ConfirmSignupRequest, ErrorResponse, SignupOk, SignupRequest},
        error_response, non_empty, provider_error_response, valid_email,
    },
    cognito::UserPool,
};
use axum::{Json, extract::Extension, http::StatusCode, response::{IntoResponse, Response}};
use std::sync::Arc;
use tracing::instrument;

/// Birthdate attribute is mandatory in the pool schema; self-service signups
/// that omit it get this placeholder.
const DEFAULT_BIRTHDATE: &str = "1990-01-01";

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User registered, confirmation may be pending", body = SignupOk),
        (status = 400, description = "Username, password or email missing", body = ErrorResponse),
        (status = 500, description = "Provider rejected the signup", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn signup(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<SignupRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let (Some(username), Some(password), Some(email)) = (
        non_empty(payload.username.as_deref()),
        non_empty(payload.password.as_deref()),
        non_empty(payload.email.as_deref()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username, password and email are required",
        );
    };

    if !valid_email(email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email");
    }

    let birthdate = non_empty(payload.birthdate.as_deref()).unwrap_or(DEFAULT_BIRTHDATE);

    match pool.sign_up(username, password, email, birthdate).await {
        Ok(response) => Json(SignupOk {
            success: true,
            user_sub: response.user_sub,
            // No delivery details means the pool confirmed the user outright.
            is_confirmed: response.code_delivery_details.is_none(),
        })
        .into_response(),
        Err(err) => provider_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/confirm-signup",
    request_body = ConfirmSignupRequest,
    responses(
        (status = 200, description = "Signup confirmed", body = Ack),
        (status = 400, description = "Username or confirmation code missing", body = ErrorResponse),
        (status = 500, description = "Provider rejected the confirmation", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn confirm_signup(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<ConfirmSignupRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let (Some(username), Some(confirmation_code)) = (
        non_empty(payload.username.as_deref()),
        non_empty(payload.confirmation_code.as_deref()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username and confirmation code are required",
        );
    };

    match pool.confirm_sign_up(username, confirmation_code).await {
        Ok(()) => Json(Ack { success: true }).into_response(),
        Err(err) => provider_error_response(&err),
    }
}
