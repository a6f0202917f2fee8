use secrecy::SecretString;

/// Process-wide provider configuration.
///
/// The client secret and the admin secret access key never appear in logs;
/// `Debug` redacts both.
#[derive(Clone)]
pub struct GlobalArgs {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    pub client_secret: Option<SecretString>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<SecretString>,
    pub endpoint: Option<String>,
    pub insecure_tls: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(region: String, user_pool_id: String, client_id: String) -> Self {
        Self {
            region,
            user_pool_id,
            client_id,
            client_secret: None,
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            insecure_tls: false,
        }
    }

    /// Provider base URL: explicit endpoint override, or the regional default.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        self.endpoint.as_ref().map_or_else(
            || format!("https://cognito-idp.{}.amazonaws.com", self.region),
            |endpoint| endpoint.trim_end_matches('/').to_string(),
        )
    }

    /// Token issuer URL for this pool, used for id-token verification.
    #[must_use]
    pub fn issuer_url(&self) -> String {
        format!("{}/{}", self.endpoint_url(), self.user_pool_id)
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("region", &self.region)
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .field("endpoint", &self.endpoint)
            .field("insecure_tls", &self.insecure_tls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn args() -> GlobalArgs {
        GlobalArgs::new(
            "us-east-1".to_string(),
            "us-east-1_PoolId".to_string(),
            "client-id".to_string(),
        )
    }

    #[test]
    fn test_global_args() {
        let args = args();
        assert_eq!(args.region, "us-east-1");
        assert!(args.client_secret.is_none());
        assert!(!args.insecure_tls);
    }

    #[test]
    fn endpoint_defaults_to_region() {
        assert_eq!(
            args().endpoint_url(),
            "https://cognito-idp.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn endpoint_override_trims_trailing_slash() {
        let mut args = args();
        args.endpoint = Some("http://localhost:9229/".to_string());
        assert_eq!(args.endpoint_url(), "http://localhost:9229");
        assert_eq!(args.issuer_url(), "http://localhost:9229/us-east-1_PoolId");
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut args = args();
        args.client_secret = Some(SecretString::from("hunter2".to_string()));
        args.secret_access_key = Some(SecretString::from("hunter2".to_string()));
        let rendered = format!("{args:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(args.client_secret.map(|s| s.expose_secret().len()), Some(7));
    }
}
