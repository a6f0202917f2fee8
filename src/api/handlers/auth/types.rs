//! Request/response types for the auth routes.
//!
//! Field names mirror what the original frontend sends and expects
//! (camelCase). Request fields are optional so handlers can answer 400 with
//! a route-specific message instead of a serde rejection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SigninRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetNewPasswordRequest {
    pub username: Option<String>,
    pub new_password: Option<String>,
    pub session: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub birthdate: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSignupRequest {
    pub username: Option<String>,
    pub confirmation_code: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub access_token: Option<String>,
    pub previous_password: Option<String>,
    pub proposed_password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub username: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmForgotPasswordRequest {
    pub username: Option<String>,
    pub confirmation_code: Option<String>,
    pub new_password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GetUserRequest {
    pub access_token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserGroupsRequest {
    pub username: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddUserToGroupRequest {
    pub username: Option<String>,
    pub group_name: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminSignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub birthdate: Option<String>,
    pub group_name: Option<String>,
    #[serde(default)]
    pub temporary_password: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AdminConfirmRequest {
    pub username: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Ack {
    pub success: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AckMessage {
    pub success: bool,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupOk {
    pub success: bool,
    pub user_sub: Option<String>,
    pub is_confirmed: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOk {
    pub success: bool,
    pub challenge_name: String,
    pub session: Option<String>,
}

/// User payload returned after a successful authentication. Groups and roles
/// are projected from the id token claims; tokens are relayed verbatim.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub username: String,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub groups: Vec<String>,
    pub roles: Vec<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SigninOk {
    pub success: bool,
    pub user: SessionUser,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordOk {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_delivery_details: Option<Value>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BasicUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct GetUserOk {
    pub success: bool,
    pub user: BasicUser,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub group_name: Option<String>,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    pub precedence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<f64>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListGroupsOk {
    pub success: bool,
    pub groups: Vec<GroupRecord>,
    pub total_groups: usize,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserGroupsOk {
    pub success: bool,
    pub groups: Vec<GroupRecord>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PasswordInfo {
    pub password: String,
    pub is_generated: bool,
    pub is_temporary: bool,
    pub must_change_on_first_login: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminSignupOk {
    pub success: bool,
    pub message: String,
    pub user_sub: Option<String>,
    pub is_confirmed: bool,
    pub group_assigned: Option<String>,
    pub password_info: PasswordInfo,
}

/// Error body shared by every route.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signin_request_tolerates_missing_fields() -> Result<(), serde_json::Error> {
        let request: SigninRequest = serde_json::from_value(json!({"username": "alice"}))?;
        assert_eq!(request.username.as_deref(), Some("alice"));
        assert!(request.password.is_none());
        Ok(())
    }

    #[test]
    fn admin_signup_defaults_temporary_to_false() -> Result<(), serde_json::Error> {
        let request: AdminSignupRequest =
            serde_json::from_value(json!({"username": "bob", "email": "bob@example.com"}))?;
        assert!(!request.temporary_password);
        Ok(())
    }

    #[test]
    fn session_user_serializes_camel_case() -> Result<(), serde_json::Error> {
        let user = SessionUser {
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            access_token: "access".to_string(),
            refresh_token: None,
            id_token: Some("id".to_string()),
            groups: vec!["Admins".to_string()],
            roles: vec![],
        };
        let value = serde_json::to_value(&user)?;
        assert!(value.get("accessToken").is_some());
        assert!(value.get("idToken").is_some());
        assert!(value.get("access_token").is_none());
        Ok(())
    }

    #[test]
    fn group_record_omits_missing_dates() -> Result<(), serde_json::Error> {
        let record = GroupRecord {
            group_name: Some("Admins".to_string()),
            description: None,
            role_arn: None,
            precedence: Some(1),
            creation_date: None,
            last_modified_date: None,
        };
        let value = serde_json::to_value(&record)?;
        assert!(value.get("groupName").is_some());
        assert!(value.get("creationDate").is_none());
        Ok(())
    }
}
