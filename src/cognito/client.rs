use crate::{
    APP_USER_AGENT,
    cli::globals::GlobalArgs,
    cognito::{
        Error, secret_hash, sigv4,
        types::{
            AdminCreateUserResponse, AuthResponse, ForgotPasswordResponse, GetUserResponse, Group,
            GroupsResponse, SignUpResponse,
        },
    },
};
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use tracing::{debug, error, instrument};
use url::Url;

const SERVICE: &str = "cognito-idp";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService.";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Message fragment the provider uses for IAM authorization failures.
const NOT_AUTHORIZED_FRAGMENT: &str = "is not authorized to perform";

enum Auth {
    /// App-client command: client id (+ secret hash) inside the body.
    Client,
    /// Administrative command: SigV4-signed with deployment credentials.
    Signed,
}

struct Credentials {
    access_key_id: String,
    secret_access_key: SecretString,
}

/// One user pool, one HTTP client.
///
/// Every command is a `POST` to the pool endpoint; the command name travels
/// in `X-Amz-Target`. Nothing here retries: callers see the first error.
pub struct UserPool {
    http: Client,
    endpoint: String,
    host: String,
    region: String,
    user_pool_id: String,
    client_id: String,
    client_secret: Option<SecretString>,
    credentials: Option<Credentials>,
}

impl UserPool {
    /// Build the pool client from process configuration.
    ///
    /// # Errors
    /// Returns an error if the endpoint cannot be parsed or the HTTP client
    /// cannot be constructed.
    pub fn new(globals: &GlobalArgs) -> Result<Self, Error> {
        let endpoint = globals.endpoint_url();
        let parsed = Url::parse(&endpoint).map_err(|e| Error::Endpoint(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::Endpoint(format!("missing host in {endpoint}")))?;
        let host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .use_rustls_tls()
            .danger_accept_invalid_certs(globals.insecure_tls)
            .build()?;

        let credentials = match (&globals.access_key_id, &globals.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Credentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            http,
            endpoint,
            host,
            region: globals.region.clone(),
            user_pool_id: globals.user_pool_id.clone(),
            client_id: globals.client_id.clone(),
            client_secret: globals.client_secret.clone(),
            credentials,
        })
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    #[must_use]
    pub const fn has_client_secret(&self) -> bool {
        self.client_secret.is_some()
    }

    #[must_use]
    pub const fn has_admin_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Secret hash for `username`, required by confidential app clients.
    ///
    /// # Errors
    /// Returns [`Error::MissingClientSecret`] when no secret is configured;
    /// this is a deployment problem, not a user error.
    pub fn secret_hash(&self, username: &str) -> Result<String, Error> {
        self.client_secret.as_ref().map_or(
            Err(Error::MissingClientSecret),
            |secret| {
                Ok(secret_hash::derive(
                    secret.expose_secret(),
                    username,
                    &self.client_id,
                ))
            },
        )
    }

    /// Secret hash when a secret is configured, `None` for public clients.
    fn maybe_secret_hash(&self, username: &str) -> Option<String> {
        self.client_secret
            .as_ref()
            .map(|secret| secret_hash::derive(secret.expose_secret(), username, &self.client_id))
    }

    async fn send(&self, command: &str, body: &Value, auth: Auth) -> Result<Value, Error> {
        let amz_target = format!("{TARGET_PREFIX}{command}");
        let payload = serde_json::to_vec(body)?;

        let mut request = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", &amz_target)
            .header(CONTENT_TYPE, AMZ_JSON)
            .body(payload.clone());

        if matches!(auth, Auth::Signed) {
            let credentials = self.credentials.as_ref().ok_or(Error::MissingCredentials)?;
            let key = sigv4::SigningKey {
                access_key_id: &credentials.access_key_id,
                secret_access_key: credentials.secret_access_key.expose_secret(),
                region: &self.region,
                service: SERVICE,
            };
            let signed = sigv4::sign(
                &key,
                &self.host,
                AMZ_JSON,
                &amz_target,
                &payload,
                OffsetDateTime::now_utc(),
            )
            .map_err(|e| Error::Signing(e.to_string()))?;
            request = request
                .header("X-Amz-Date", signed.amz_date)
                .header(AUTHORIZATION, signed.authorization);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let err = decode_error(status, &bytes);
            error!("{command} failed: {err}");
            return Err(err);
        }

        debug!("{command} succeeded");

        if bytes.is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// `InitiateAuth` with the username/password flow.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the command or the transport fails.
    #[instrument(skip(self, password))]
    pub async fn initiate_auth(&self, username: &str, password: &str) -> Result<AuthResponse, Error> {
        let mut auth_parameters = Map::new();
        auth_parameters.insert("USERNAME".to_string(), json!(username));
        auth_parameters.insert("PASSWORD".to_string(), json!(password));
        if let Some(hash) = self.maybe_secret_hash(username) {
            auth_parameters.insert("SECRET_HASH".to_string(), json!(hash));
        }

        let body = json!({
            "ClientId": self.client_id,
            "AuthFlow": "USER_PASSWORD_AUTH",
            "AuthParameters": auth_parameters,
        });

        let value = self.send("InitiateAuth", &body, Auth::Client).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `RespondToAuthChallenge` for the mandatory password change challenge.
    ///
    /// The session is relayed verbatim; the provider alone decides whether it
    /// is still valid.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the command or the transport fails.
    #[instrument(skip(self, new_password, session))]
    pub async fn respond_new_password(
        &self,
        username: &str,
        new_password: &str,
        session: &str,
    ) -> Result<AuthResponse, Error> {
        let mut responses = Map::new();
        responses.insert("USERNAME".to_string(), json!(username));
        responses.insert("NEW_PASSWORD".to_string(), json!(new_password));
        if let Some(hash) = self.maybe_secret_hash(username) {
            responses.insert("SECRET_HASH".to_string(), json!(hash));
        }

        let body = json!({
            "ClientId": self.client_id,
            "ChallengeName": "NEW_PASSWORD_REQUIRED",
            "Session": session,
            "ChallengeResponses": responses,
        });

        let value = self
            .send("RespondToAuthChallenge", &body, Auth::Client)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Self-service `SignUp`.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the command or the transport fails.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
        birthdate: &str,
    ) -> Result<SignUpResponse, Error> {
        let mut body = Map::new();
        body.insert("ClientId".to_string(), json!(self.client_id));
        body.insert("Username".to_string(), json!(username));
        body.insert("Password".to_string(), json!(password));
        body.insert(
            "UserAttributes".to_string(),
            json!([
                {"Name": "email", "Value": email},
                {"Name": "birthdate", "Value": birthdate},
            ]),
        );
        if let Some(hash) = self.maybe_secret_hash(username) {
            body.insert("SecretHash".to_string(), json!(hash));
        }

        let value = self.send("SignUp", &Value::Object(body), Auth::Client).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `ConfirmSignUp` with the emailed confirmation code.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the command or the transport fails.
    #[instrument(skip(self, confirmation_code))]
    pub async fn confirm_sign_up(
        &self,
        username: &str,
        confirmation_code: &str,
    ) -> Result<(), Error> {
        let mut body = Map::new();
        body.insert("ClientId".to_string(), json!(self.client_id));
        body.insert("Username".to_string(), json!(username));
        body.insert("ConfirmationCode".to_string(), json!(confirmation_code));
        if let Some(hash) = self.maybe_secret_hash(username) {
            body.insert("SecretHash".to_string(), json!(hash));
        }

        self.send("ConfirmSignUp", &Value::Object(body), Auth::Client)
            .await?;
        Ok(())
    }

    /// `ForgotPassword`: ask the provider to deliver a reset code.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the command or the transport fails.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, username: &str) -> Result<ForgotPasswordResponse, Error> {
        let mut body = Map::new();
        body.insert("ClientId".to_string(), json!(self.client_id));
        body.insert("Username".to_string(), json!(username));
        if let Some(hash) = self.maybe_secret_hash(username) {
            body.insert("SecretHash".to_string(), json!(hash));
        }

        let value = self
            .send("ForgotPassword", &Value::Object(body), Auth::Client)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `ConfirmForgotPassword`: set the new password with the emailed code.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the command or the transport fails.
    #[instrument(skip(self, confirmation_code, new_password))]
    pub async fn confirm_forgot_password(
        &self,
        username: &str,
        confirmation_code: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        let mut body = Map::new();
        body.insert("ClientId".to_string(), json!(self.client_id));
        body.insert("Username".to_string(), json!(username));
        body.insert("ConfirmationCode".to_string(), json!(confirmation_code));
        body.insert("Password".to_string(), json!(new_password));
        if let Some(hash) = self.maybe_secret_hash(username) {
            body.insert("SecretHash".to_string(), json!(hash));
        }

        self.send("ConfirmForgotPassword", &Value::Object(body), Auth::Client)
            .await?;
        Ok(())
    }

    /// `ChangePassword`, authorized by the caller's access token.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the command or the transport fails.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        access_token: &str,
        previous_password: &str,
        proposed_password: &str,
    ) -> Result<(), Error> {
        let body = json!({
            "AccessToken": access_token,
            "PreviousPassword": previous_password,
            "ProposedPassword": proposed_password,
        });

        self.send("ChangePassword", &body, Auth::Client).await?;
        Ok(())
    }

    /// `GetUser`, authorized by the caller's access token.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the command or the transport fails.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<GetUserResponse, Error> {
        let body = json!({ "AccessToken": access_token });
        let value = self.send("GetUser", &body, Auth::Client).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `AdminCreateUser` with the email pre-verified and the welcome message
    /// suppressed, matching the internal-user provisioning flow.
    ///
    /// # Errors
    /// Returns an error if deployment credentials are missing, the provider
    /// rejects the command, or the transport fails.
    #[instrument(skip(self, temporary_password))]
    pub async fn admin_create_user(
        &self,
        username: &str,
        email: &str,
        birthdate: &str,
        temporary_password: Option<&str>,
    ) -> Result<AdminCreateUserResponse, Error> {
        let mut body = Map::new();
        body.insert("UserPoolId".to_string(), json!(self.user_pool_id));
        body.insert("Username".to_string(), json!(username));
        body.insert(
            "UserAttributes".to_string(),
            json!([
                {"Name": "email", "Value": email},
                {"Name": "email_verified", "Value": "true"},
                {"Name": "birthdate", "Value": birthdate},
            ]),
        );
        body.insert("MessageAction".to_string(), json!("SUPPRESS"));
        if let Some(password) = temporary_password {
            body.insert("TemporaryPassword".to_string(), json!(password));
        }

        let value = self
            .send("AdminCreateUser", &Value::Object(body), Auth::Signed)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `AdminSetUserPassword`, permanent or temporary.
    ///
    /// # Errors
    /// Returns an error if deployment credentials are missing, the provider
    /// rejects the command, or the transport fails.
    #[instrument(skip(self, password))]
    pub async fn admin_set_user_password(
        &self,
        username: &str,
        password: &str,
        permanent: bool,
    ) -> Result<(), Error> {
        let body = json!({
            "UserPoolId": self.user_pool_id,
            "Username": username,
            "Password": password,
            "Permanent": permanent,
        });

        self.send("AdminSetUserPassword", &body, Auth::Signed).await?;
        Ok(())
    }

    /// `AdminConfirmSignUp`: confirm a user without a code.
    ///
    /// # Errors
    /// Returns an error if deployment credentials are missing, the provider
    /// rejects the command, or the transport fails.
    #[instrument(skip(self))]
    pub async fn admin_confirm_sign_up(&self, username: &str) -> Result<(), Error> {
        let body = json!({
            "UserPoolId": self.user_pool_id,
            "Username": username,
        });

        self.send("AdminConfirmSignUp", &body, Auth::Signed).await?;
        Ok(())
    }

    /// `AdminAddUserToGroup`.
    ///
    /// # Errors
    /// Returns an error if deployment credentials are missing, the provider
    /// rejects the command, or the transport fails.
    #[instrument(skip(self))]
    pub async fn admin_add_user_to_group(
        &self,
        username: &str,
        group_name: &str,
    ) -> Result<(), Error> {
        let body = json!({
            "UserPoolId": self.user_pool_id,
            "Username": username,
            "GroupName": group_name,
        });

        self.send("AdminAddUserToGroup", &body, Auth::Signed).await?;
        Ok(())
    }

    /// `AdminListGroupsForUser`: groups a user belongs to.
    ///
    /// # Errors
    /// Returns an error if deployment credentials are missing, the provider
    /// rejects the command, or the transport fails.
    #[instrument(skip(self))]
    pub async fn admin_list_groups_for_user(&self, username: &str) -> Result<Vec<Group>, Error> {
        let body = json!({
            "UserPoolId": self.user_pool_id,
            "Username": username,
        });

        let value = self
            .send("AdminListGroupsForUser", &body, Auth::Signed)
            .await?;
        let response: GroupsResponse = serde_json::from_value(value)?;
        Ok(response.groups)
    }

    /// `ListGroups`: all groups in the pool, up to `limit`.
    ///
    /// # Errors
    /// Returns an error if deployment credentials are missing, the provider
    /// rejects the command, or the transport fails.
    #[instrument(skip(self))]
    pub async fn list_groups(&self, limit: u32) -> Result<Vec<Group>, Error> {
        let body = json!({
            "UserPoolId": self.user_pool_id,
            "Limit": limit,
        });

        let value = self.send("ListGroups", &body, Auth::Signed).await?;
        let response: GroupsResponse = serde_json::from_value(value)?;
        Ok(response.groups)
    }
}

impl std::fmt::Debug for UserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPool")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("admin_credentials", &self.credentials.is_some())
            .finish()
    }
}

/// Decode a provider error body: `{"__type": "...", "message": "..."}`.
///
/// The `__type` may be namespaced (`com.example#NotAuthorizedException`);
/// only the fragment after `#` matters.
fn decode_error(status: StatusCode, bytes: &[u8]) -> Error {
    let value: Value = serde_json::from_slice(bytes).unwrap_or(Value::Null);

    let kind = value
        .get("__type")
        .and_then(Value::as_str)
        .map(|kind| kind.rsplit('#').next().unwrap_or(kind).to_string())
        .unwrap_or_else(|| status.to_string());

    let message = value
        .get("message")
        .or_else(|| value.get("Message"))
        .and_then(Value::as_str)
        .map_or_else(|| format!("{kind}: request failed"), str::to_string);

    if message.contains(NOT_AUTHORIZED_FRAGMENT) {
        return Error::AccessDenied(message);
    }

    Error::Provider { kind, message }
}
