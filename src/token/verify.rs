//! Id-token verification against the pool's published JWKS.
//!
//! The pool serves its RSA signing keys at
//! `{issuer}/.well-known/jwks.json`. Keys are cached in memory with a TTL;
//! a token carrying an unknown `kid` triggers one refresh, throttled so a
//! burst of bad tokens cannot hammer the provider. If a refresh fails the
//! last known keyset keeps serving.

use crate::token::{Error, decode_claims, decode_segment};
use base64ct::{Base64UrlUnpadded, Encoding};
use reqwest::Client;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant, SystemTime},
};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

const JWKS_CACHE_TTL_SECONDS: u64 = 300;
const JWKS_REFRESH_COOLDOWN_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    pub kty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    pub kid: String,
    pub n: String,
    pub e: String,
}

impl Jwk {
    /// Build a JWK from an `RsaPublicKey`.
    ///
    /// # Errors
    /// Returns an error if the key cannot be converted to a JWK.
    pub fn from_rsa_public_key(
        public_key: &RsaPublicKey,
        kid: impl Into<String>,
    ) -> Result<Self, Error> {
        use rsa::traits::PublicKeyParts;

        Ok(Self {
            kty: "RSA".to_string(),
            alg: Some("RS256".to_string()),
            key_use: Some("sig".to_string()),
            kid: kid.into(),
            n: Base64UrlUnpadded::encode_string(&public_key.n().to_bytes_be()),
            e: Base64UrlUnpadded::encode_string(&public_key.e().to_bytes_be()),
        })
    }

    /// Convert this JWK to an `RsaPublicKey`.
    ///
    /// # Errors
    /// Returns an error if the base64url values cannot be decoded or the RSA
    /// key is invalid.
    pub fn to_rsa_public_key(&self) -> Result<RsaPublicKey, Error> {
        let n_bytes = Base64UrlUnpadded::decode_vec(&self.n).map_err(|_| Error::Base64)?;
        let e_bytes = Base64UrlUnpadded::decode_vec(&self.e).map_err(|_| Error::Base64)?;
        let n = BigUint::from_bytes_be(&n_bytes);
        let e = BigUint::from_bytes_be(&e_bytes);
        RsaPublicKey::new(n, e).map_err(Error::Rsa)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    #[must_use]
    pub fn find_by_kid(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

#[derive(Debug)]
struct JwksCache {
    jwks: Jwks,
    fetched_at: Instant,
}

impl JwksCache {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < Duration::from_secs(JWKS_CACHE_TTL_SECONDS)
    }
}

#[derive(Debug)]
enum KeySource {
    /// Verification turned off (`--skip-token-verification`).
    Disabled,
    /// Pinned keyset, never refreshed.
    Static(Jwks),
    /// Keyset fetched from the pool and refreshed as needed.
    Remote {
        url: String,
        client: Client,
        cache: RwLock<JwksCache>,
        last_refresh_unix: AtomicU64,
    },
}

/// Verifies id tokens issued by the pool.
///
/// Checks the RS256 signature, issuer, audience, token use, and expiry.
/// When disabled it accepts everything, restoring the original application's
/// decode-only behavior.
#[derive(Debug)]
pub struct IdTokenVerifier {
    issuer: String,
    audience: String,
    source: KeySource,
}

impl IdTokenVerifier {
    /// A verifier that accepts every token without looking at it.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            issuer: String::new(),
            audience: String::new(),
            source: KeySource::Disabled,
        }
    }

    /// Build from a pinned keyset, no remote refresh.
    #[must_use]
    pub fn from_jwks(jwks: Jwks, issuer: String, audience: String) -> Self {
        Self {
            issuer,
            audience,
            source: KeySource::Static(jwks),
        }
    }

    /// Build a verifier that fetches the pool's JWKS.
    ///
    /// The startup fetch is best-effort: if the pool is unreachable the
    /// verifier starts with an empty, stale cache and fails closed until a
    /// refresh succeeds.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub async fn new(issuer: String, audience: String, insecure_tls: bool) -> Result<Self, Error> {
        let url = format!("{issuer}/.well-known/jwks.json");

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .use_rustls_tls()
            .danger_accept_invalid_certs(insecure_tls)
            .build()?;

        let (jwks, fetched_at, last_refresh_unix) = match fetch_jwks(&client, &url).await {
            Ok(jwks) => {
                info!(jwks_keys = jwks.keys.len(), "jwks fetched");
                (jwks, Instant::now(), now_unix_seconds())
            }
            Err(err) => {
                warn!(
                    url = %url,
                    error = %err,
                    "jwks fetch failed during startup; continuing with empty keyset"
                );
                (Jwks::default(), stale_instant(), 0)
            }
        };

        Ok(Self {
            issuer,
            audience,
            source: KeySource::Remote {
                url,
                client,
                cache: RwLock::new(JwksCache { jwks, fetched_at }),
                last_refresh_unix: AtomicU64::new(last_refresh_unix),
            },
        })
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self.source, KeySource::Disabled)
    }

    /// Dependency status for `/health`.
    pub async fn dependency_status(&self) -> &'static str {
        match &self.source {
            KeySource::Disabled => "disabled",
            KeySource::Static(_) => "static",
            KeySource::Remote { url, .. } => match self.refresh_jwks().await {
                Ok(()) => "ok",
                Err(err) => {
                    warn!(error = %err, url = %url, "jwks fetch failed during health check");
                    "error"
                }
            },
        }
    }

    /// Verify an id token.
    ///
    /// # Errors
    /// Returns an error describing the first check that failed. A disabled
    /// verifier accepts everything.
    pub async fn verify(&self, token: &str) -> Result<(), Error> {
        if matches!(self.source, KeySource::Disabled) {
            return Ok(());
        }

        let parts: Vec<&str> = token.split('.').collect();
        let [header_b64, payload_b64, signature_b64] = parts.as_slice() else {
            return Err(Error::TokenFormat);
        };

        let header: Header = serde_json::from_value(decode_segment(header_b64)?)?;
        if header.alg != "RS256" {
            return Err(Error::UnsupportedAlg(header.alg));
        }
        let kid = header.kid.unwrap_or_default();

        let jwk = self.find_key(&kid).await?;
        let verifying_key = VerifyingKey::<Sha256>::new(jwk.to_rsa_public_key()?);

        let signing_input = format!("{header_b64}.{payload_b64}");
        let signature_bytes = Base64UrlUnpadded::decode_vec(signature_b64.trim_end_matches('='))
            .map_err(|_| Error::Base64)?;
        let signature = Signature::try_from(signature_bytes.as_slice())
            .map_err(|_| Error::InvalidSignature)?;
        verifying_key
            .verify(signing_input.as_bytes(), &signature)
            .map_err(|_| Error::InvalidSignature)?;

        let claims = decode_claims(token)?;

        if claims.get("iss").and_then(Value::as_str) != Some(self.issuer.as_str()) {
            return Err(Error::InvalidIssuer);
        }

        let audience_ok = match claims.get("aud") {
            Some(Value::String(audience)) => *audience == self.audience,
            Some(Value::Array(audiences)) => audiences
                .iter()
                .any(|value| value.as_str() == Some(self.audience.as_str())),
            _ => false,
        };
        if !audience_ok {
            return Err(Error::InvalidAudience);
        }

        if let Some(token_use) = claims.get("token_use").and_then(Value::as_str)
            && token_use != "id"
        {
            return Err(Error::InvalidTokenUse);
        }

        let expires_at = claims.get("exp").and_then(Value::as_i64).unwrap_or(0);
        if expires_at <= now_unix_seconds_i64() {
            return Err(Error::Expired);
        }

        Ok(())
    }

    /// Key lookup: cached keyset first; on unknown `kid`, refresh once with
    /// cooldown and retry.
    async fn find_key(&self, kid: &str) -> Result<Jwk, Error> {
        if let Some(jwk) = self.cached_key(kid).await {
            return Ok(jwk);
        }

        match self.refresh_on_unknown_kid().await {
            Ok(true) => {}
            Ok(false) => return Err(Error::UnknownKid(kid.to_string())),
            Err(err) => {
                error!("jwks refresh failed: {err}");
                return Err(Error::UnknownKid(kid.to_string()));
            }
        }

        self.cached_key(kid)
            .await
            .ok_or_else(|| Error::UnknownKid(kid.to_string()))
    }

    async fn cached_key(&self, kid: &str) -> Option<Jwk> {
        match &self.source {
            KeySource::Disabled => None,
            KeySource::Static(jwks) => jwks.find_by_kid(kid).cloned(),
            KeySource::Remote { cache, .. } => {
                let cache = cache.read().await;
                if !cache.is_fresh() {
                    drop(cache);
                    if let Err(err) = self.refresh_jwks().await {
                        // Keep serving the stale keyset; verification of known
                        // kids continues to work.
                        warn!("jwks refresh failed: {err}");
                    }
                    return match &self.source {
                        KeySource::Remote { cache, .. } => {
                            cache.read().await.jwks.find_by_kid(kid).cloned()
                        }
                        _ => None,
                    };
                }
                cache.jwks.find_by_kid(kid).cloned()
            }
        }
    }

    async fn refresh_jwks(&self) -> Result<(), Error> {
        let KeySource::Remote {
            url, client, cache, ..
        } = &self.source
        else {
            return Ok(());
        };

        let jwks = fetch_jwks(client, url).await?;
        let mut cache = cache.write().await;
        cache.jwks = jwks;
        cache.fetched_at = Instant::now();
        info!(jwks_keys = cache.jwks.keys.len(), "jwks cache refreshed");
        Ok(())
    }

    async fn refresh_on_unknown_kid(&self) -> Result<bool, Error> {
        let KeySource::Remote {
            last_refresh_unix, ..
        } = &self.source
        else {
            return Ok(false);
        };

        let now = now_unix_seconds();
        let last = last_refresh_unix.load(Ordering::Relaxed);
        if now.saturating_sub(last) < JWKS_REFRESH_COOLDOWN_SECONDS {
            // Avoid hammering the pool when many unknown-kid tokens arrive.
            return Ok(false);
        }
        last_refresh_unix.store(now, Ordering::Relaxed);
        self.refresh_jwks().await?;
        Ok(true)
    }
}

async fn fetch_jwks(client: &Client, url: &str) -> Result<Jwks, Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json().await?)
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

fn now_unix_seconds_i64() -> i64 {
    i64::try_from(now_unix_seconds()).unwrap_or(i64::MAX)
}

/// An Instant that is already stale, forcing an early refresh.
fn stale_instant() -> Instant {
    Instant::now()
        .checked_sub(Duration::from_secs(JWKS_CACHE_TTL_SECONDS + 1))
        .unwrap_or_else(Instant::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rsa::RsaPrivateKey;
    use rsa::pkcs1v15::SigningKey;
    use rsa::signature::{SignatureEncoding, Signer};
    use serde_json::json;

    const ISSUER: &str = "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_Ab1cdEfgh";
    const AUDIENCE: &str = "abc123";
    const KID: &str = "test-key-1";

    fn test_private_key() -> RsaPrivateKey {
        let mut rng = StdRng::seed_from_u64(7);
        RsaPrivateKey::new(&mut rng, 2048).expect("test key generation")
    }

    fn jwks_for(private_key: &RsaPrivateKey) -> Result<Jwks, Error> {
        let jwk = Jwk::from_rsa_public_key(&RsaPublicKey::from(private_key), KID)?;
        Ok(Jwks { keys: vec![jwk] })
    }

    fn sign_token(private_key: &RsaPrivateKey, kid: &str, claims: &serde_json::Value) -> String {
        let header = json!({"alg": "RS256", "typ": "JWT", "kid": kid});
        let header_b64 = Base64UrlUnpadded::encode_string(header.to_string().as_bytes());
        let claims_b64 = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
        let signing_input = format!("{header_b64}.{claims_b64}");

        let signing_key = SigningKey::<Sha256>::new(private_key.clone());
        let signature: rsa::pkcs1v15::Signature = signing_key.sign(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&signature.to_vec());

        format!("{signing_input}.{signature_b64}")
    }

    fn valid_claims() -> serde_json::Value {
        json!({
            "sub": "u1",
            "iss": ISSUER,
            "aud": AUDIENCE,
            "token_use": "id",
            "exp": now_unix_seconds_i64() + 3600,
            "iat": now_unix_seconds_i64() - 1
        })
    }

    #[tokio::test]
    async fn accepts_valid_token() -> Result<(), Error> {
        let private_key = test_private_key();
        let verifier = IdTokenVerifier::from_jwks(
            jwks_for(&private_key)?,
            ISSUER.to_string(),
            AUDIENCE.to_string(),
        );
        let token = sign_token(&private_key, KID, &valid_claims());
        verifier.verify(&token).await
    }

    #[tokio::test]
    async fn rejects_unknown_kid() -> Result<(), Error> {
        let private_key = test_private_key();
        let verifier = IdTokenVerifier::from_jwks(
            jwks_for(&private_key)?,
            ISSUER.to_string(),
            AUDIENCE.to_string(),
        );
        let token = sign_token(&private_key, "other-kid", &valid_claims());
        let result = verifier.verify(&token).await;
        assert!(matches!(result, Err(Error::UnknownKid(_))));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_tampered_payload() -> Result<(), Error> {
        let private_key = test_private_key();
        let verifier = IdTokenVerifier::from_jwks(
            jwks_for(&private_key)?,
            ISSUER.to_string(),
            AUDIENCE.to_string(),
        );
        let token = sign_token(&private_key, KID, &valid_claims());

        let mut claims = valid_claims();
        claims["sub"] = json!("attacker");
        let forged_payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{forged_payload}.{}", parts[0], parts[2]);

        let result = verifier.verify(&forged).await;
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_expired_token() -> Result<(), Error> {
        let private_key = test_private_key();
        let verifier = IdTokenVerifier::from_jwks(
            jwks_for(&private_key)?,
            ISSUER.to_string(),
            AUDIENCE.to_string(),
        );
        let mut claims = valid_claims();
        claims["exp"] = json!(now_unix_seconds_i64() - 10);
        let token = sign_token(&private_key, KID, &claims);
        let result = verifier.verify(&token).await;
        assert!(matches!(result, Err(Error::Expired)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_wrong_audience_and_issuer() -> Result<(), Error> {
        let private_key = test_private_key();
        let verifier = IdTokenVerifier::from_jwks(
            jwks_for(&private_key)?,
            ISSUER.to_string(),
            AUDIENCE.to_string(),
        );

        let mut claims = valid_claims();
        claims["aud"] = json!("someone-else");
        let token = sign_token(&private_key, KID, &claims);
        assert!(matches!(
            verifier.verify(&token).await,
            Err(Error::InvalidAudience)
        ));

        let mut claims = valid_claims();
        claims["iss"] = json!("https://evil.example.com");
        let token = sign_token(&private_key, KID, &claims);
        assert!(matches!(
            verifier.verify(&token).await,
            Err(Error::InvalidIssuer)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_access_tokens() -> Result<(), Error> {
        let private_key = test_private_key();
        let verifier = IdTokenVerifier::from_jwks(
            jwks_for(&private_key)?,
            ISSUER.to_string(),
            AUDIENCE.to_string(),
        );
        let mut claims = valid_claims();
        claims["token_use"] = json!("access");
        let token = sign_token(&private_key, KID, &claims);
        assert!(matches!(
            verifier.verify(&token).await,
            Err(Error::InvalidTokenUse)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn disabled_verifier_accepts_anything() {
        let verifier = IdTokenVerifier::disabled();
        assert!(!verifier.is_enabled());
        assert!(verifier.verify("not-a-token").await.is_ok());
        assert_eq!(verifier.dependency_status().await, "disabled");
    }

    #[test]
    fn jwk_round_trips_public_key() -> Result<(), Error> {
        let private_key = test_private_key();
        let public_key = RsaPublicKey::from(&private_key);
        let jwk = Jwk::from_rsa_public_key(&public_key, KID)?;
        assert_eq!(jwk.to_rsa_public_key()?, public_key);
        Ok(())
    }
}
