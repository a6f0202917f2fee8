use crate::{
    api::handlers::{
        auth::types::{
            Ack, ChangePasswordRequest, ConfirmForgotPasswordRequest, ErrorResponse,
            ForgotPasswordOk, ForgotPasswordRequest,
        },
        error_response, non_empty, provider_error_response,
    },
    cognito::UserPool,
};
use axum::{Json, extract::Extension, http::StatusCode, response::{IntoResponse, Response}};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = Ack),
        (status = 400, description = "Access token or passwords missing", body = ErrorResponse),
        (status = 500, description = "Provider rejected the change", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn change_password(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let (Some(access_token), Some(previous_password), Some(proposed_password)) = (
        non_empty(payload.access_token.as_deref()),
        non_empty(payload.previous_password.as_deref()),
        non_empty(payload.proposed_password.as_deref()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Access token, previous password and proposed password are required",
        );
    };

    match pool
        .change_password(access_token, previous_password, proposed_password)
        .await
    {
        Ok(()) => Json(Ack { success: true }).into_response(),
        Err(err) => provider_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset code requested", body = ForgotPasswordOk),
        (status = 400, description = "Username missing", body = ErrorResponse),
        (status = 500, description = "Provider rejected the request", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn forgot_password(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let Some(username) = non_empty(payload.username.as_deref()) else {
        return error_response(StatusCode::BAD_REQUEST, "Username is required");
    };

    match pool.forgot_password(username).await {
        Ok(response) => Json(ForgotPasswordOk {
            success: true,
            code_delivery_details: response.code_delivery_details,
        })
        .into_response(),
        Err(err) => provider_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/confirm-forgot-password",
    request_body = ConfirmForgotPasswordRequest,
    responses(
        (status = 200, description = "New password set", body = Ack),
        (status = 400, description = "Username, confirmation code or new password missing", body = ErrorResponse),
        (status = 500, description = "Provider rejected the confirmation", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn confirm_forgot_password(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<ConfirmForgotPasswordRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let (Some(username), Some(confirmation_code), Some(new_password)) = (
        non_empty(payload.username.as_deref()),
        non_empty(payload.confirmation_code.as_deref()),
        non_empty(payload.new_password.as_deref()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username, confirmation code and new password are required",
        );
    };

    match pool
        .confirm_forgot_password(username, confirmation_code, new_password)
        .await
    {
        Ok(()) => Json(Ack { success: true }).into_response(),
        Err(err) => provider_error_response(&err),
    }
}
