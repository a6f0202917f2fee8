use crate::{
    api::handlers::{
        PERMISSIONS_HINT,
        auth::{
            group_record,
            types::{
                AckMessage, AddUserToGroupRequest, ErrorResponse, ListGroupsOk, UserGroupsOk,
                UserGroupsRequest,
            },
        },
        error_response, non_empty, provider_error_response,
    },
    cognito::{Error, UserPool},
};
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

/// Upper bound on groups returned by the pool-wide listing.
const LIST_GROUPS_LIMIT: u32 = 60;

/// The group-listing UI always wants a `groups` array, even on failure, so
/// its error bodies carry an empty list next to the error message.
fn list_groups_error(err: &Error) -> Response {
    match err {
        Error::AccessDenied(message) => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": PERMISSIONS_HINT,
                "details": message,
                "groups": [],
            })),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": err.to_string(),
                "groups": [],
            })),
        )
            .into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/list-groups",
    responses(
        (status = 200, description = "Groups defined in the pool", body = ListGroupsOk),
        (status = 403, description = "Deployment credentials lack the listing permission", body = ErrorResponse),
        (status = 500, description = "Deployment credentials missing or provider failure", body = ErrorResponse),
    ),
    tag = "groups"
)]
#[instrument(skip(pool))]
pub async fn list_groups(pool: Extension<Arc<UserPool>>) -> Response {
    if !pool.has_admin_credentials() {
        return list_groups_error(&Error::MissingCredentials);
    }

    match pool.list_groups(LIST_GROUPS_LIMIT).await {
        Ok(groups) => {
            let groups: Vec<_> = groups
                .into_iter()
                .map(|group| group_record(group, true))
                .collect();
            let total_groups = groups.len();
            Json(ListGroupsOk {
                success: true,
                groups,
                total_groups,
            })
            .into_response()
        }
        Err(err) => list_groups_error(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/get-user-groups",
    request_body = UserGroupsRequest,
    responses(
        (status = 200, description = "Groups the user belongs to", body = UserGroupsOk),
        (status = 400, description = "Username missing", body = ErrorResponse),
        (status = 500, description = "Provider failure", body = ErrorResponse),
    ),
    tag = "groups"
)]
#[instrument(skip(pool, payload))]
pub async fn get_user_groups(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<UserGroupsRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let Some(username) = non_empty(payload.username.as_deref()) else {
        return error_response(StatusCode::BAD_REQUEST, "Username is required");
    };

    match pool.admin_list_groups_for_user(username).await {
        Ok(groups) => Json(UserGroupsOk {
            success: true,
            groups: groups
                .into_iter()
                .map(|group| group_record(group, false))
                .collect(),
        })
        .into_response(),
        Err(err) => provider_error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/add-user-to-group",
    request_body = AddUserToGroupRequest,
    responses(
        (status = 200, description = "Membership added", body = AckMessage),
        (status = 400, description = "Username or group name missing", body = ErrorResponse),
        (status = 403, description = "Deployment credentials lack the membership permission", body = ErrorResponse),
        (status = 500, description = "Deployment credentials missing or provider failure", body = ErrorResponse),
    ),
    tag = "groups"
)]
#[instrument(skip(pool, payload))]
pub async fn add_user_to_group(
    pool: Extension<Arc<UserPool>>,
    payload: Option<Json<AddUserToGroupRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let (Some(username), Some(group_name)) = (
        non_empty(payload.username.as_deref()),
        non_empty(payload.group_name.as_deref()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username and group name are required",
        );
    };

    match pool.admin_add_user_to_group(username, group_name).await {
        Ok(()) => Json(AckMessage {
            success: true,
            message: format!("User {username} added to group {group_name}"),
        })
        .into_response(),
        Err(err) => provider_error_response(&err),
    }
}
