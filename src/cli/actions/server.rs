use crate::{api, cli::globals::GlobalArgs, cognito, token};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    pub insecure_tls: bool,
    pub skip_token_verification: bool,
    pub frontend_base_url: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the provider client cannot be built or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mut globals = GlobalArgs::new(args.region, args.user_pool_id, args.client_id);
    globals.client_secret = args.client_secret.map(SecretString::from);
    globals.access_key_id = args.access_key_id;
    globals.secret_access_key = args.secret_access_key.map(SecretString::from);
    globals.endpoint = args.endpoint;
    globals.insecure_tls = args.insecure_tls;

    if globals.insecure_tls {
        warn!("provider certificate validation is disabled");
    }

    debug!("Global args: {:?}", globals);

    let pool = Arc::new(
        cognito::UserPool::new(&globals).context("Failed to build the user pool client")?,
    );

    let verifier = if args.skip_token_verification {
        warn!("id-token signature verification is disabled");
        Arc::new(token::IdTokenVerifier::disabled())
    } else {
        Arc::new(
            token::IdTokenVerifier::new(
                globals.issuer_url(),
                globals.client_id.clone(),
                globals.insecure_tls,
            )
            .await
            .context("Failed to build the id-token verifier")?,
        )
    };

    api::new(args.port, &args.frontend_base_url, pool, verifier).await
}
