//! ID token (JWT) verification against the provider's published signing keys.
//!
//! The verifier checks signature, `iss`, `aud`, `exp` and returns the `sub`
//! claim. Keys are fetched from the JWKS endpoint on every call; there is no
//! key cache.

use async_trait::async_trait;
use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header, errors::ErrorKind, jwk::JwkSet,
};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::services::auth::upstream::UpstreamError;

/// Algorithms the provider is allowed to sign ID tokens with.
pub const ALLOWED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::RS256, Algorithm::ES256, Algorithm::EdDSA];

/// The provider's opaque user identifier (`sub`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(pub String);

impl Subject {
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed id token: {0}")]
    Malformed(String),
    #[error("unsupported id token alg: {0:?}")]
    UnsupportedAlg(Algorithm),
    #[error("missing kid in id token header")]
    MissingKid,
    #[error("unknown signing key: {0}")]
    UnknownKey(String),
    #[error("unusable signing key: {0}")]
    InvalidKey(String),
    #[error("id token audience mismatch")]
    AudienceMismatch,
    #[error("id token rejected: {0}")]
    Rejected(jsonwebtoken::errors::Error),
    #[error("empty 'sub' claim")]
    EmptySubject,
    #[error("signing keys unavailable: {0}")]
    KeysUnavailable(#[from] UpstreamError),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidAudience => Self::AudienceMismatch,
            _ => Self::Rejected(e),
        }
    }
}

/// Verifies an ID token for the given audience and returns its subject.
#[async_trait]
pub trait JwtVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str, expected_audience: &str) -> Result<Subject, AuthError>;
}

#[derive(Debug, Clone, Deserialize)]
struct IdTokenClaims {
    sub: String,
}

/// `JwtVerifier` backed by a remote JWKS document.
#[derive(Clone, Debug)]
pub struct JwksIdTokenVerifier {
    http: reqwest::Client,
    certs_url: Url,
    issuers: Vec<String>,
    leeway_seconds: u64,
}

impl JwksIdTokenVerifier {
    pub fn new(
        http: reqwest::Client,
        certs_url: Url,
        issuers: Vec<String>,
        leeway_seconds: u64,
    ) -> Self {
        Self {
            http,
            certs_url,
            issuers,
            leeway_seconds,
        }
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, UpstreamError> {
        let response = self
            .http
            .get(self.certs_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    fn validation(&self, alg: Algorithm, expected_audience: &str) -> Validation {
        let mut validation = Validation::new(alg);
        validation.set_audience(&[expected_audience]);
        validation.set_issuer(self.issuers.as_slice());
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = self.leeway_seconds;
        validation
    }
}

#[async_trait]
impl JwtVerifier for JwksIdTokenVerifier {
    async fn verify(&self, token: &str, expected_audience: &str) -> Result<Subject, AuthError> {
        // Header checks first so garbage never costs a round trip.
        let header = decode_header(token).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::UnsupportedAlg(header.alg));
        }
        let kid = header.kid.ok_or(AuthError::MissingKid)?;

        let jwks = self.fetch_jwks().await?;
        let jwk = jwks
            .find(&kid)
            .ok_or_else(|| AuthError::UnknownKey(kid.clone()))?;
        let key = DecodingKey::from_jwk(jwk).map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        let data = decode::<IdTokenClaims>(
            token,
            &key,
            &self.validation(header.alg, expected_audience),
        )?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::EmptySubject);
        }

        Ok(Subject(data.claims.sub))
    }
}
