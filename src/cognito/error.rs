use thiserror::Error;

/// Provider client errors.
///
/// `MissingClientSecret` and `MissingCredentials` are configuration errors
/// raised before any remote call. `AccessDenied` is split out from the other
/// provider errors so routes can answer 403 with a permissions hint instead
/// of a bare 500.
#[derive(Debug, Error)]
pub enum Error {
    #[error("client secret is not configured")]
    MissingClientSecret,
    #[error("deployment credentials are not configured for administrative commands")]
    MissingCredentials,
    #[error("{0}")]
    AccessDenied(String),
    #[error("{message}")]
    Provider { kind: String, message: String },
    #[error("invalid provider endpoint: {0}")]
    Endpoint(String),
    #[error("failed to sign request: {0}")]
    Signing(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid json in provider response")]
    Json(#[from] serde_json::Error),
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(&'static str),
}

impl Error {
    /// True when the route boundary should answer with a configuration error
    /// (HTTP 500) without having touched the provider.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingClientSecret | Self::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(Error::MissingClientSecret.is_configuration());
        assert!(Error::MissingCredentials.is_configuration());
        assert!(!Error::AccessDenied("nope".to_string()).is_configuration());
    }

    #[test]
    fn provider_error_displays_message_only() {
        let err = Error::Provider {
            kind: "NotAuthorizedException".to_string(),
            message: "Incorrect username or password.".to_string(),
        };
        assert_eq!(err.to_string(), "Incorrect username or password.");
    }
}
