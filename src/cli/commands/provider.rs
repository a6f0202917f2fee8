use clap::{Arg, ArgAction, ArgGroup, Command};

/// User-pool provider arguments.
///
/// The client secret and admin credentials are optional: routes that need a
/// missing piece fail with a configuration error before any remote call.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("region")
                .long("region")
                .help("Provider region, example: us-east-1")
                .env("PORDEGO_REGION")
                .required(true),
        )
        .arg(
            Arg::new("user-pool-id")
                .long("user-pool-id")
                .help("User pool identifier, example: us-east-1_Ab1cdEfgh")
                .env("PORDEGO_USER_POOL_ID")
                .required(true),
        )
        .arg(
            Arg::new("client-id")
                .long("client-id")
                .help("App client identifier registered with the user pool")
                .env("PORDEGO_CLIENT_ID")
                .required(true),
        )
        .arg(
            Arg::new("client-secret")
                .long("client-secret")
                .help("App client secret (confidential clients only, never sent to the browser)")
                .env("PORDEGO_CLIENT_SECRET"),
        )
        .arg(
            Arg::new("access-key-id")
                .long("access-key-id")
                .help("Deployment access key id for signed admin commands")
                .env("PORDEGO_ACCESS_KEY_ID")
                .requires("secret-access-key"),
        )
        .arg(
            Arg::new("secret-access-key")
                .long("secret-access-key")
                .help("Deployment secret access key for signed admin commands")
                .env("PORDEGO_SECRET_ACCESS_KEY")
                .requires("access-key-id"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .help("Provider endpoint override for local emulators, example: http://localhost:9229")
                .env("PORDEGO_ENDPOINT"),
        )
        .arg(
            Arg::new("insecure-tls")
                .long("insecure-tls")
                .help("Skip provider certificate validation (non-production environments only)")
                .env("PORDEGO_INSECURE_TLS")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("skip-token-verification")
                .long("skip-token-verification")
                .help("Do not verify id-token signatures against the pool JWKS")
                .env("PORDEGO_SKIP_TOKEN_VERIFICATION")
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("admin-credentials")
                .args(["access-key-id", "secret-access-key"])
                .multiple(true),
        )
}
