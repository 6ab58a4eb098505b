/// Factory: build `TokenVerificationService` from application `Config`.
use std::sync::Arc;

use tracing::error;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{
    TokenVerificationService, id_token::JwksIdTokenVerifier, introspection::TokenInfoClient,
};

pub fn build_verification_service(
    config: &Config,
) -> Result<Arc<TokenVerificationService>, AppError> {
    // One client for both upstream calls; the timeout bounds every request to the provider.
    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            error!(error = %e, "failed to build upstream http client");
            AppError::Internal
        })?;

    let jwt = JwksIdTokenVerifier::new(
        http.clone(),
        config.id_token_certs_url.clone(),
        config.id_token_issuers.clone(),
        config.id_token_leeway_seconds,
    );
    let introspector = TokenInfoClient::new(http, config.tokeninfo_url.clone());

    Ok(Arc::new(TokenVerificationService::new(
        config.client.client_id.clone(),
        Arc::new(jwt),
        Arc::new(introspector),
    )))
}
