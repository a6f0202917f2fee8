//! Wire types for provider command responses.
//!
//! Field names follow the provider's PascalCase JSON. Everything the routes
//! merely relay (code delivery details, for instance) stays a raw
//! `serde_json::Value` so nothing is lost in translation.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

/// Response to `InitiateAuth` and `RespondToAuthChallenge`.
///
/// Exactly one of `authentication_result` or `challenge_name`+`session` is
/// expected; the provider drives which. The gateway relays challenges
/// verbatim and never judges their validity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthResponse {
    pub authentication_result: Option<AuthenticationResult>,
    pub challenge_name: Option<String>,
    pub session: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignUpResponse {
    pub user_sub: Option<String>,
    pub user_confirmed: Option<bool>,
    pub code_delivery_details: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForgotPasswordResponse {
    pub code_delivery_details: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetUserResponse {
    pub username: Option<String>,
    #[serde(default)]
    pub user_attributes: Vec<Attribute>,
}

impl GetUserResponse {
    /// Value of a named user attribute, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.user_attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .and_then(|attribute| attribute.value.as_deref())
    }
}

/// Group record as returned by `ListGroups` and `AdminListGroupsForUser`.
/// Dates are epoch seconds with fractional millis, as the provider sends them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    pub group_name: Option<String>,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    pub precedence: Option<i64>,
    pub creation_date: Option<f64>,
    pub last_modified_date: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupsResponse {
    #[serde(default)]
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedUser {
    pub username: Option<String>,
    pub enabled: Option<bool>,
    pub user_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdminCreateUserResponse {
    pub user: Option<CreatedUser>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_response_with_tokens() -> Result<(), serde_json::Error> {
        let value = json!({
            "AuthenticationResult": {
                "AccessToken": "access",
                "IdToken": "id",
                "RefreshToken": "refresh",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        });
        let response: AuthResponse = serde_json::from_value(value)?;
        let result = response.authentication_result.as_ref();
        assert_eq!(
            result.and_then(|r| r.access_token.as_deref()),
            Some("access")
        );
        assert!(response.challenge_name.is_none());
        Ok(())
    }

    #[test]
    fn auth_response_with_challenge() -> Result<(), serde_json::Error> {
        let value = json!({
            "ChallengeName": "NEW_PASSWORD_REQUIRED",
            "Session": "opaque-session",
            "ChallengeParameters": {"USER_ID_FOR_SRP": "u1"}
        });
        let response: AuthResponse = serde_json::from_value(value)?;
        assert_eq!(
            response.challenge_name.as_deref(),
            Some("NEW_PASSWORD_REQUIRED")
        );
        assert_eq!(response.session.as_deref(), Some("opaque-session"));
        assert!(response.authentication_result.is_none());
        Ok(())
    }

    #[test]
    fn get_user_attribute_lookup() -> Result<(), serde_json::Error> {
        let value = json!({
            "Username": "alice",
            "UserAttributes": [
                {"Name": "sub", "Value": "u1"},
                {"Name": "email", "Value": "alice@example.com"}
            ]
        });
        let response: GetUserResponse = serde_json::from_value(value)?;
        assert_eq!(response.attribute("email"), Some("alice@example.com"));
        assert_eq!(response.attribute("birthdate"), None);
        Ok(())
    }

    #[test]
    fn groups_default_to_empty() -> Result<(), serde_json::Error> {
        let response: GroupsResponse = serde_json::from_value(json!({}))?;
        assert!(response.groups.is_empty());
        Ok(())
    }
}
