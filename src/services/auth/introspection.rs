//! Access token introspection via the provider's `tokeninfo` endpoint.
//!
//! Access tokens are opaque, so the only way to learn who they belong to (and
//! which client they were issued to) is to ask the provider.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::services::auth::upstream::UpstreamError;

/// Subset of the `tokeninfo` response this service reads.
///
/// Invalid, expired and revoked tokens come back as `{"error": "invalid_token", ...}`
/// (usually with HTTP 400).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    // Client id the token was issued for.
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenInfo {
    /// Provider reported the token as unusable. An empty `error` does not count.
    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn audience_matches(&self, client_id: &str) -> bool {
        self.audience.as_deref() == Some(client_id)
    }
}

#[async_trait]
pub trait TokenIntrospector: Send + Sync + 'static {
    async fn introspect(&self, access_token: &str) -> Result<TokenInfo, UpstreamError>;
}

/// `TokenIntrospector` calling `GET <tokeninfo_url>?access_token=...`.
#[derive(Clone, Debug)]
pub struct TokenInfoClient {
    http: reqwest::Client,
    tokeninfo_url: Url,
}

impl TokenInfoClient {
    pub fn new(http: reqwest::Client, tokeninfo_url: Url) -> Self {
        Self {
            http,
            tokeninfo_url,
        }
    }
}

#[async_trait]
impl TokenIntrospector for TokenInfoClient {
    async fn introspect(&self, access_token: &str) -> Result<TokenInfo, UpstreamError> {
        let response = self
            .http
            .get(self.tokeninfo_url.clone())
            .query(&[("access_token", access_token)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let info: TokenInfo =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        // A 4xx is only a token answer when the provider says what was wrong.
        if !status.is_success() && !info.is_error() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(info)
    }
}
