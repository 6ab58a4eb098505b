/*
 * Responsibility
 * - /verify の request/response DTO
 * - wire format: {"id_token_status": {"valid", "gplus_id", "message"}, "access_token_status": {...}}
 *   (実行していない check の key は出さない)
 */
use serde::{Deserialize, Serialize};

use crate::services::auth::{
    TokenStatus, TokenVerificationRequest, verification::TokenVerificationReport,
};

#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

impl VerifyParams {
    /// Field-wise merge; values already present in `self` win.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            id_token: self.id_token.or(fallback.id_token),
            access_token: self.access_token.or(fallback.access_token),
        }
    }
}

impl From<VerifyParams> for TokenVerificationRequest {
    fn from(p: VerifyParams) -> Self {
        Self {
            id_token: p.id_token,
            access_token: p.access_token,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenStatusResponse {
    pub valid: bool,
    // Always serialized, `null` unless valid.
    pub gplus_id: Option<String>,
    pub message: String,
}

impl From<TokenStatus> for TokenStatusResponse {
    fn from(s: TokenStatus) -> Self {
        Self {
            valid: s.is_valid(),
            gplus_id: s.subject_id,
            message: s.message.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct VerifyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_status: Option<TokenStatusResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_status: Option<TokenStatusResponse>,
}

impl From<TokenVerificationReport> for VerifyResponse {
    fn from(r: TokenVerificationReport) -> Self {
        Self {
            id_token_status: r.id_token_status.map(Into::into),
            access_token_status: r.access_token_status.map(Into::into),
        }
    }
}
