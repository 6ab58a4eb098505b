use std::sync::Arc;

use tracing::{info, warn};

use crate::services::auth::id_token::{AuthError, JwtVerifier};
use crate::services::auth::introspection::TokenIntrospector;
use crate::services::auth::upstream::UpstreamError;

pub const ID_TOKEN_VALID: &str = "ID Token is valid.";
pub const ID_TOKEN_INVALID: &str = "Invalid ID Token.";
pub const ACCESS_TOKEN_VALID: &str = "Access Token is valid.";
pub const ACCESS_TOKEN_INVALID: &str = "Invalid Access Token.";
pub const ACCESS_TOKEN_WRONG_AUDIENCE: &str = "Access Token not meant for this app.";

/// Why a check came out the way it did. Not part of the HTTP body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    TokenInvalid,
    AudienceMismatch,
}

/// Outcome of one token check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    pub verdict: Verdict,
    // Provider's opaque user id; only set on a valid token.
    pub subject_id: Option<String>,
    pub message: &'static str,
}

impl TokenStatus {
    fn valid(subject_id: Option<String>, message: &'static str) -> Self {
        Self {
            verdict: Verdict::Valid,
            subject_id,
            message,
        }
    }

    fn rejected(verdict: Verdict, message: &'static str) -> Self {
        Self {
            verdict,
            subject_id: None,
            message,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.verdict == Verdict::Valid
    }
}

/// Tokens supplied by the caller. `None` or `""` means "do not check".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenVerificationRequest {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

/// One entry per check that actually ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenVerificationReport {
    pub id_token_status: Option<TokenStatus>,
    pub access_token_status: Option<TokenStatus>,
}

/// Checks ID tokens and access tokens against this deployment's client id.
#[derive(Clone)]
pub struct TokenVerificationService {
    client_id: String,
    jwt: Arc<dyn JwtVerifier>,
    introspector: Arc<dyn TokenIntrospector>,
}

impl std::fmt::Debug for TokenVerificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerificationService")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl TokenVerificationService {
    pub fn new(
        client_id: impl Into<String>,
        jwt: Arc<dyn JwtVerifier>,
        introspector: Arc<dyn TokenIntrospector>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            jwt,
            introspector,
        }
    }

    /// Runs every check the request asks for.
    ///
    /// Token problems end up inside the report. Only a failure to reach the
    /// provider is returned as `Err`, and it fails the whole request.
    pub async fn verify(
        &self,
        req: &TokenVerificationRequest,
    ) -> Result<TokenVerificationReport, UpstreamError> {
        let mut report = TokenVerificationReport::default();

        if let Some(token) = non_empty(req.id_token.as_deref()) {
            report.id_token_status = Some(self.check_id_token(token).await?);
        }

        if let Some(token) = non_empty(req.access_token.as_deref()) {
            report.access_token_status = Some(self.check_access_token(token).await?);
        }

        Ok(report)
    }

    pub async fn check_id_token(&self, token: &str) -> Result<TokenStatus, UpstreamError> {
        match self.jwt.verify(token, &self.client_id).await {
            Ok(subject) => {
                info!(sub = %subject.0, "id token accepted");
                Ok(TokenStatus::valid(Some(subject.into_inner()), ID_TOKEN_VALID))
            }
            Err(AuthError::KeysUnavailable(e)) => Err(e),
            Err(AuthError::AudienceMismatch) => {
                warn!("id token rejected: issued for another client");
                Ok(TokenStatus::rejected(
                    Verdict::AudienceMismatch,
                    ID_TOKEN_INVALID,
                ))
            }
            Err(err) => {
                warn!(error = %err, "id token rejected");
                Ok(TokenStatus::rejected(Verdict::TokenInvalid, ID_TOKEN_INVALID))
            }
        }
    }

    pub async fn check_access_token(&self, token: &str) -> Result<TokenStatus, UpstreamError> {
        let info = self.introspector.introspect(token).await?;

        if info.is_error() {
            warn!(
                error = info.error.as_deref().unwrap_or_default(),
                description = info.error_description.as_deref().unwrap_or_default(),
                "access token rejected by provider"
            );
            return Ok(TokenStatus::rejected(
                Verdict::TokenInvalid,
                ACCESS_TOKEN_INVALID,
            ));
        }

        // A token issued to another client must never identify a user here.
        if !info.audience_matches(&self.client_id) {
            warn!(
                audience = info.audience.as_deref().unwrap_or_default(),
                "access token rejected: issued for another client"
            );
            return Ok(TokenStatus::rejected(
                Verdict::AudienceMismatch,
                ACCESS_TOKEN_WRONG_AUDIENCE,
            ));
        }

        info!(
            user_id = info.user_id.as_deref().unwrap_or_default(),
            scope = info.scope.as_deref().unwrap_or_default(),
            expires_in = info.expires_in,
            "access token accepted"
        );
        Ok(TokenStatus::valid(info.user_id, ACCESS_TOKEN_VALID))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::introspection::TokenInfo;
    use crate::services::auth::test_support::{CLIENT_ID, FakeIntrospector, FakeJwtVerifier};

    fn service(jwt: FakeJwtVerifier, introspector: FakeIntrospector) -> TokenVerificationService {
        TokenVerificationService::new(CLIENT_ID, Arc::new(jwt), Arc::new(introspector))
    }

    fn request(id_token: Option<&str>, access_token: Option<&str>) -> TokenVerificationRequest {
        TokenVerificationRequest {
            id_token: id_token.map(String::from),
            access_token: access_token.map(String::from),
        }
    }

    #[tokio::test]
    async fn no_tokens_means_no_checks() {
        let jwt = Arc::new(FakeJwtVerifier::default());
        let introspector = Arc::new(FakeIntrospector::default());
        let svc = TokenVerificationService::new(CLIENT_ID, jwt.clone(), introspector.clone());

        let report = svc.verify(&request(None, None)).await.unwrap();
        assert_eq!(report, TokenVerificationReport::default());

        let report = svc.verify(&request(Some(""), Some(""))).await.unwrap();
        assert_eq!(report, TokenVerificationReport::default());

        assert_eq!(jwt.calls(), 0);
        assert_eq!(introspector.calls(), 0);
    }

    #[tokio::test]
    async fn valid_id_token_reports_subject() {
        let svc = service(
            FakeJwtVerifier::default().accepting("id.good", CLIENT_ID, "1101"),
            FakeIntrospector::default(),
        );

        let report = svc.verify(&request(Some("id.good"), None)).await.unwrap();

        let status = report.id_token_status.unwrap();
        assert!(status.is_valid());
        assert_eq!(status.subject_id.as_deref(), Some("1101"));
        assert_eq!(status.message, ID_TOKEN_VALID);
        assert!(report.access_token_status.is_none());
    }

    #[tokio::test]
    async fn id_token_for_other_client_is_invalid_but_distinguishable() {
        let svc = service(
            FakeJwtVerifier::default().accepting("id.other", "other-client", "1101"),
            FakeIntrospector::default(),
        );

        let status = svc.check_id_token("id.other").await.unwrap();

        assert_eq!(status.verdict, Verdict::AudienceMismatch);
        assert_eq!(status.message, ID_TOKEN_INVALID);
        assert_eq!(status.subject_id, None);
    }

    #[tokio::test]
    async fn unverifiable_id_token_is_invalid() {
        let svc = service(FakeJwtVerifier::default(), FakeIntrospector::default());

        let status = svc.check_id_token("garbage").await.unwrap();

        assert_eq!(status.verdict, Verdict::TokenInvalid);
        assert_eq!(status.message, ID_TOKEN_INVALID);
        assert_eq!(status.subject_id, None);
    }

    #[tokio::test]
    async fn access_token_reported_invalid_by_provider() {
        let svc = service(FakeJwtVerifier::default(), FakeIntrospector::default());

        let status = svc.check_access_token("ya29.revoked").await.unwrap();

        assert_eq!(status.verdict, Verdict::TokenInvalid);
        assert_eq!(status.message, ACCESS_TOKEN_INVALID);
        assert_eq!(status.subject_id, None);
    }

    #[tokio::test]
    async fn access_token_for_other_client_is_rejected() {
        let svc = service(
            FakeJwtVerifier::default(),
            FakeIntrospector::default().with("ya29.stolen", "evil-client", "1101"),
        );

        let status = svc.check_access_token("ya29.stolen").await.unwrap();

        assert_eq!(status.verdict, Verdict::AudienceMismatch);
        assert_eq!(status.message, ACCESS_TOKEN_WRONG_AUDIENCE);
        assert_eq!(status.subject_id, None);
    }

    #[tokio::test]
    async fn access_token_for_this_client_is_valid() {
        let svc = service(
            FakeJwtVerifier::default(),
            FakeIntrospector::default().with("ya29.good", CLIENT_ID, "1101"),
        );

        let status = svc.check_access_token("ya29.good").await.unwrap();

        assert!(status.is_valid());
        assert_eq!(status.subject_id.as_deref(), Some("1101"));
        assert_eq!(status.message, ACCESS_TOKEN_VALID);
    }

    #[tokio::test]
    async fn access_token_without_audience_is_rejected() {
        let svc = service(
            FakeJwtVerifier::default(),
            FakeIntrospector::default().with_info(
                "ya29.no-aud",
                TokenInfo {
                    user_id: Some("1101".into()),
                    expires_in: Some(3600),
                    ..Default::default()
                },
            ),
        );

        let status = svc.check_access_token("ya29.no-aud").await.unwrap();

        assert_eq!(status.verdict, Verdict::AudienceMismatch);
        assert_eq!(status.message, ACCESS_TOKEN_WRONG_AUDIENCE);
        assert_eq!(status.subject_id, None);
    }

    #[tokio::test]
    async fn access_token_without_user_id_is_valid_with_no_subject() {
        let svc = service(
            FakeJwtVerifier::default(),
            FakeIntrospector::default().with_info(
                "ya29.no-user",
                TokenInfo {
                    audience: Some(CLIENT_ID.into()),
                    scope: Some("openid".into()),
                    ..Default::default()
                },
            ),
        );

        let status = svc.check_access_token("ya29.no-user").await.unwrap();

        assert!(status.is_valid());
        assert_eq!(status.subject_id, None);
        assert_eq!(status.message, ACCESS_TOKEN_VALID);
    }

    #[tokio::test]
    async fn checks_are_independent() {
        let svc = service(
            FakeJwtVerifier::default().accepting("id.good", CLIENT_ID, "1101"),
            FakeIntrospector::default(),
        );

        let report = svc
            .verify(&request(Some("id.good"), Some("ya29.unknown")))
            .await
            .unwrap();

        assert!(report.id_token_status.unwrap().is_valid());
        assert_eq!(
            report.access_token_status.unwrap().message,
            ACCESS_TOKEN_INVALID
        );
    }

    #[tokio::test]
    async fn provider_outage_is_not_an_invalid_token() {
        let svc = service(
            FakeJwtVerifier::default(),
            FakeIntrospector::failing(|| UpstreamError::Timeout),
        );
        let err = svc
            .verify(&request(None, Some("ya29.any")))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let svc = service(FakeJwtVerifier::unavailable(), FakeIntrospector::default());
        let err = svc
            .verify(&request(Some("id.any"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn repeated_checks_give_identical_reports() {
        let svc = service(
            FakeJwtVerifier::default().accepting("id.good", CLIENT_ID, "1101"),
            FakeIntrospector::default().with("ya29.good", CLIENT_ID, "1101"),
        );
        let req = request(Some("id.good"), Some("ya29.good"));

        let first = svc.verify(&req).await.unwrap();
        let second = svc.verify(&req).await.unwrap();

        assert_eq!(first, second);
    }
}
