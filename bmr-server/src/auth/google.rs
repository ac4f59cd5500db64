//! Google ID token verification
//!
//! Tokens are RS256 JWTs signed with Google's rotating keys. The key set is
//! fetched from the public certs endpoint and cached in-process.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use tokio::sync::RwLock;

use crate::error::BoxError;

const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
const CACHE_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    name: Option<String>,
}

/// Verified identity carried by a Google ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
}

fn token_invalid(message: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::GoogleTokenInvalid, message)
}

#[derive(Clone)]
pub struct GoogleVerifier {
    client_id: String,
    certs_url: String,
    cache: Arc<RwLock<Option<CacheEntry>>>,
    client: reqwest::Client,
}

impl GoogleVerifier {
    pub fn new(client_id: impl Into<String>) -> Result<Self, BoxError> {
        Ok(Self {
            client_id: client_id.into(),
            certs_url: GOOGLE_CERTS_URL.to_string(),
            cache: Arc::new(RwLock::new(None)),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()?,
        })
    }

    async fn get_jwks(&self) -> Result<JwkSet, AppError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache
                && entry.fetched_at.elapsed() < CACHE_TTL
            {
                return Ok(entry.jwks.clone());
            }
        }

        let jwks = self.fetch_jwks().await?;
        *self.cache.write().await = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AppError> {
        let response = self.client.get(&self.certs_url).send().await.map_err(|e| {
            tracing::error!("Google JWKS fetch failed: {e}");
            AppError::new(ErrorCode::NetworkError)
        })?;
        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "Google JWKS endpoint returned an error");
            return Err(AppError::new(ErrorCode::NetworkError));
        }
        response.json().await.map_err(|e| {
            tracing::error!("Google JWKS parse failed: {e}");
            AppError::new(ErrorCode::NetworkError)
        })
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AppError> {
        let jwks = self.get_jwks().await?;
        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .ok_or_else(|| token_invalid("Unknown Google signing key."))?;
        jwk_to_decoding_key(jwk)
    }

    /// Verify signature, audience, issuer and expiry of an ID token
    pub async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AppError> {
        if self.client_id.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::ConfigError,
                "Google sign-in is not configured.",
            ));
        }

        let header = jsonwebtoken::decode_header(id_token)
            .map_err(|_| token_invalid("Malformed Google ID token."))?;
        let kid = header
            .kid
            .ok_or_else(|| token_invalid("Google ID token has no key id."))?;
        let key = self.decoding_key(&kid).await?;

        let data = jsonwebtoken::decode::<GoogleClaims>(
            id_token,
            &key,
            &validation(&self.client_id),
        )
        .map_err(|e| {
            tracing::debug!("Google ID token rejected: {e}");
            token_invalid("Invalid Google ID token.")
        })?;

        identity_from_claims(data.claims)
    }
}

fn validation(client_id: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[client_id]);
    validation.set_issuer(&GOOGLE_ISSUERS);
    validation
}

fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| {
                tracing::error!("Failed to build RSA key from Google JWKS: {e}");
                AppError::internal("Failed to load Google signing key")
            }),
        _ => Err(token_invalid("Unsupported Google signing key.")),
    }
}

fn identity_from_claims(claims: GoogleClaims) -> Result<GoogleIdentity, AppError> {
    let email = claims
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| token_invalid("Google token missing email."))?;
    Ok(GoogleIdentity {
        email,
        email_verified: claims.email_verified,
        name: claims.name.filter(|n| !n.trim().is_empty()),
    })
}

/// Username for a new Google account: the email local part, then numbered
/// variants when taken.
pub fn username_candidate(email: &str, attempt: u32) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if base.is_empty() {
        base.push_str("user");
    }
    if attempt == 0 {
        base
    } else {
        format!("{base}{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_pins_rs256_audience_and_issuers() {
        let v = validation("client-123");
        assert_eq!(v.algorithms, vec![Algorithm::RS256]);
        assert!(v.aud.as_ref().unwrap().contains("client-123"));
        let iss = v.iss.as_ref().unwrap();
        assert!(iss.contains("accounts.google.com"));
        assert!(iss.contains("https://accounts.google.com"));
    }

    #[test]
    fn identity_requires_email() {
        let claims: GoogleClaims = serde_json::from_value(serde_json::json!({
            "email_verified": true,
            "name": "Jane"
        }))
        .unwrap();
        let err = identity_from_claims(claims).unwrap_err();
        assert_eq!(err.code, ErrorCode::GoogleTokenInvalid);
        assert_eq!(err.message, "Google token missing email.");
    }

    #[test]
    fn identity_from_full_claims() {
        let claims: GoogleClaims = serde_json::from_value(serde_json::json!({
            "email": "jane@example.com",
            "email_verified": true,
            "name": "Jane Tan"
        }))
        .unwrap();
        let identity = identity_from_claims(claims).unwrap();
        assert_eq!(identity.email, "jane@example.com");
        assert!(identity.email_verified);
        assert_eq!(identity.name.as_deref(), Some("Jane Tan"));
    }

    #[test]
    fn unverified_email_defaults_to_false() {
        let claims: GoogleClaims =
            serde_json::from_value(serde_json::json!({ "email": "x@example.com" })).unwrap();
        assert!(!identity_from_claims(claims).unwrap().email_verified);
    }

    #[test]
    fn username_candidates() {
        assert_eq!(username_candidate("jane.tan@example.com", 0), "jane.tan");
        assert_eq!(username_candidate("jane.tan@example.com", 2), "jane.tan2");
        assert_eq!(username_candidate("j+spam@example.com", 0), "jspam");
        assert_eq!(username_candidate("@example.com", 0), "user");
    }

    #[tokio::test]
    async fn unconfigured_client_is_rejected_without_network() {
        let verifier = GoogleVerifier::new("").unwrap();
        let err = verifier.verify("a.b.c").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }
}
