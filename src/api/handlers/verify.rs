/*
 * Responsibility
 * - POST /verify
 * - id_token / access_token を受け取り、検証結果を 200 + JSON で返す
 * - token が無効でも 200 (結果は body 側)。provider に届かない時だけ 502/504
 */
use axum::{Json, extract::State};

use crate::{
    api::{dto::verify::VerifyResponse, extractors::VerifyForm},
    error::AppError,
    state::AppState,
};

pub async fn verify(
    State(state): State<AppState>,
    VerifyForm(params): VerifyForm,
) -> Result<Json<VerifyResponse>, AppError> {
    let report = state.verification.verify(&params.into()).await?;
    Ok(Json(report.into()))
}
