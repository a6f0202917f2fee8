//! Auth route handlers.
//!
//! Every handler relays exactly one provider command (admin signup chains up
//! to three) and reshapes the answer. The challenge flow is owned by the
//! provider: a `ChallengeName` in an authentication response is forwarded
//! verbatim together with its session, and this service never decides
//! whether a challenge or session is still valid.

pub mod admin;
pub mod groups;
pub mod password;
pub mod signin;
pub mod signup;
pub mod types;
pub mod user;

use crate::{
    api::handlers::error_response,
    cognito::types::{AuthResponse, Group},
    token::{self, IdTokenVerifier},
};
use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use tracing::error;
use types::{ChallengeOk, GroupRecord, SessionUser, SigninOk};

/// Turn an authentication response into the route payload: either a relayed
/// challenge or the token set enriched with claims from the id token.
pub(super) async fn tokens_or_challenge(
    username: &str,
    response: AuthResponse,
    verifier: &IdTokenVerifier,
) -> Response {
    if let Some(challenge_name) = response.challenge_name {
        return Json(ChallengeOk {
            success: true,
            challenge_name,
            session: response.session,
        })
        .into_response();
    }

    let Some(result) = response.authentication_result else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unexpected provider response",
        );
    };

    let Some(access_token) = result.access_token else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unexpected provider response",
        );
    };

    let info = match &result.id_token {
        Some(id_token) => {
            if let Err(err) = verifier.verify(id_token).await {
                error!("id token failed verification: {err}");
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Identity token failed verification",
                );
            }
            // A token the provider just issued but we cannot read still means
            // "no claims": the caller gets empty groups, not an error.
            token::user_info(id_token).unwrap_or_default()
        }
        None => token::UserInfo::default(),
    };

    Json(SigninOk {
        success: true,
        user: SessionUser {
            username: username.to_string(),
            email: info.email,
            access_token,
            refresh_token: result.refresh_token,
            id_token: result.id_token,
            groups: info.groups,
            roles: info.roles,
        },
    })
    .into_response()
}

/// Project a provider group record for the frontend. `with_dates` mirrors the
/// two list shapes: the pool-wide listing carries timestamps, the per-user
/// listing does not.
pub(super) fn group_record(group: Group, with_dates: bool) -> GroupRecord {
    GroupRecord {
        group_name: group.group_name,
        description: group.description,
        role_arn: group.role_arn,
        precedence: group.precedence,
        creation_date: group.creation_date.filter(|_| with_dates),
        last_modified_date: group.last_modified_date.filter(|_| with_dates),
    }
}
