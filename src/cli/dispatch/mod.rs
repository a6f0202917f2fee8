//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! provider configuration.

use crate::cli::actions::{Action, server::Args};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let region = matches
        .get_one::<String>("region")
        .cloned()
        .context("missing required argument: --region")?;

    let user_pool_id = matches
        .get_one::<String>("user-pool-id")
        .cloned()
        .context("missing required argument: --user-pool-id")?;

    let client_id = matches
        .get_one::<String>("client-id")
        .cloned()
        .context("missing required argument: --client-id")?;

    let frontend_base_url = matches
        .get_one::<String>("frontend-base-url")
        .cloned()
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    Ok(Action::Server(Args {
        port,
        region,
        user_pool_id,
        client_id,
        client_secret: matches.get_one::<String>("client-secret").cloned(),
        access_key_id: matches.get_one::<String>("access-key-id").cloned(),
        secret_access_key: matches.get_one::<String>("secret-access-key").cloned(),
        endpoint: matches.get_one::<String>("endpoint").cloned(),
        insecure_tls: matches.get_flag("insecure-tls"),
        skip_token_verification: matches.get_flag("skip-token-verification"),
        frontend_base_url,
    }))
}
