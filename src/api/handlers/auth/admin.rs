use crate::{
    api::handlers::{
        auth::types::{
            AckMessage, AdminConfirmRequest, AdminSignupOk, AdminSignupRequest, ErrorResponse,
            PasswordInfo,
        },
        error_response, non_empty, provider_error_response, valid_email,
    },
    cognito::{Error, UserPool},
};
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rand::Rng;
use std::sync::Arc;
use tracing::instrument;

const DEFAULT_BIRTHDATE: &str = "1990-01-01";

/// Temporary password for provisioned users: recognizable shape, random
/// digits, satisfies the default pool policy (upper, lower, digit, symbol).
fn generate_temporary_password() -> String {
    let digits: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("TempPass{digits:04}!")
}

#[utoipa::path(
    post,
    path = "/api/auth/admin-signup",
    request_body = AdminSignupRequest,
    responses(
        (status = 200, description = "Internal user provisioned", body = AdminSignupOk),
        (status = 400, description = "Username or email missing", body = ErrorResponse),
        (status = 403, description = "Deployment credentials lack a provisioning permission", body = ErrorResponse),
        (status = 500, description = "Deployment credentials missing or provider failure", body = ErrorResponse),
    ),
    tag = "admin"
)]
#[instrument(skip(pool, payload))]
pub async fn admin_signup(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<AdminSignupRequest>>,
) -> Response {
    if !pool.has_admin_credentials() {
        return provider_error_response(&Error::MissingCredentials);
    }

    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let (Some(username), Some(email)) = (
        non_empty(payload.username.as_deref()),
        non_empty(payload.email.as_deref()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, "Username and email are required");
    };

    if !valid_email(email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email");
    }

    let birthdate = non_empty(payload.birthdate.as_deref()).unwrap_or(DEFAULT_BIRTHDATE);
    let group_name = non_empty(payload.group_name.as_deref());

    let supplied_password = non_empty(payload.password.as_deref()).map(str::to_string);
    let is_generated = supplied_password.is_none();
    let password = supplied_password.unwrap_or_else(generate_temporary_password);
    let is_temporary = payload.temporary_password || is_generated;

    // Create the user with the email pre-verified and no welcome message;
    // a temporary password forces a change on first login.
    let created = match pool
        .admin_create_user(
            username,
            email,
            birthdate,
            is_temporary.then_some(password.as_str()),
        )
        .await
    {
        Ok(created) => created,
        Err(err) => return provider_error_response(&err),
    };

    // A supplied, non-temporary password becomes permanent in a second step.
    if !is_temporary
        && let Err(err) = pool
            .admin_set_user_password(username, &password, true)
            .await
    {
        return provider_error_response(&err);
    }

    if let Some(group_name) = group_name
        && let Err(err) = pool.admin_add_user_to_group(username, group_name).await
    {
        return provider_error_response(&err);
    }

    Json(AdminSignupOk {
        success: true,
        message: "Internal user created".to_string(),
        user_sub: created.user.and_then(|user| user.username),
        is_confirmed: true,
        group_assigned: group_name.map(str::to_string),
        password_info: PasswordInfo {
            password,
            is_generated,
            is_temporary,
            must_change_on_first_login: is_temporary,
        },
    })
    .into_response()
}

#[utoipa::path(
    post,
    path = "/api/auth/admin-confirm",
    request_body = AdminConfirmRequest,
    responses(
        (status = 200, description = "User confirmed without a code", body = AckMessage),
        (status = 400, description = "Username missing", body = ErrorResponse),
        (status = 403, description = "Deployment credentials lack the confirmation permission", body = ErrorResponse),
        (status = 500, description = "Deployment credentials missing or provider failure", body = ErrorResponse),
    ),
    tag = "admin"
)]
#[instrument(skip(pool, payload))]
pub async fn admin_confirm(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<AdminConfirmRequest>>,
) -> Response {
    if !pool.has_admin_credentials() {
        return provider_error_response(&Error::MissingCredentials);
    }

    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let Some(username) = non_empty(payload.username.as_deref()) else {
        return error_response(StatusCode::BAD_REQUEST, "Username is required");
    };

    match pool.admin_confirm_sign_up(username).await {
        Ok(()) => Json(AckMessage {
            success: true,
            message: format!("User {username} confirmed"),
        })
        .into_response(),
        Err(err) => provider_error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_password_shape() {
        let password = generate_temporary_password();
        assert!(password.starts_with("TempPass"));
        assert!(password.ends_with('!'));
        assert_eq!(password.len(), "TempPass0000!".len());
        let digits = &password["TempPass".len()..password.len() - 1];
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }
}
