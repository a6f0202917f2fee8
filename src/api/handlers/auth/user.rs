use crate::{
    api::handlers::{
        auth::types::{BasicUser, ErrorResponse, GetUserOk, GetUserRequest},
        error_response, non_empty, provider_error_response,
    },
    cognito::UserPool,
};
use axum::{Json, extract::Extension, http::StatusCode, response::{IntoResponse, Response}};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/auth/get-user",
    request_body = GetUserRequest,
    responses(
        (status = 200, description = "User attributes for the access token's owner", body = GetUserOk),
        (status = 400, description = "Access token missing", body = ErrorResponse),
        (status = 500, description = "Provider rejected the token", body = ErrorResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn get_user(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<GetUserRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let Some(access_token) = non_empty(payload.access_token.as_deref()) else {
        return error_response(StatusCode::BAD_REQUEST, "Access token is required");
    };

    match pool.get_user(access_token).await {
        Ok(response) => {
            let email = response.attribute("email").map(str::to_string);
            Json(GetUserOk {
                success: true,
                user: BasicUser {
                    username: response.username,
                    email,
                    access_token: access_token.to_string(),
                },
            })
            .into_response()
        }
        Err(err) => provider_error_response(&err),
    }
}
