/*
 * Responsibility
 * - /verify のパラメータを query string と body (form / JSON) の両方から集める
 * - 同じ key が両方にある場合は query 側を優先
 * - 形式エラーは 400 (AppError::BadRequest) に変換
 */
use axum::{
    Form, Json,
    extract::{FromRequest, Query, Request},
    http::{HeaderMap, header},
};

use crate::api::dto::verify::VerifyParams;
use crate::error::AppError;
use crate::state::AppState;

pub struct VerifyForm(pub VerifyParams);

enum BodyKind {
    Json,
    Form,
    Ignored,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return BodyKind::Ignored;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Ignored
    }
}

impl FromRequest<AppState> for VerifyForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<VerifyParams>::try_from_uri(req.uri())
            .map_err(|e| AppError::bad_request("INVALID_QUERY", e.body_text()))?;

        let body = match body_kind(req.headers()) {
            BodyKind::Json => {
                let Json(params) = Json::<VerifyParams>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::bad_request("INVALID_BODY", e.body_text()))?;
                params
            }
            BodyKind::Form => {
                let Form(params) = Form::<VerifyParams>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::bad_request("INVALID_BODY", e.body_text()))?;
                params
            }
            BodyKind::Ignored => VerifyParams::default(),
        };

        Ok(Self(query.or(body)))
    }
}
