/*
 * Responsibility
 * - URL 構造を定義
 * - GET / (landing page), POST /verify (token 検証), GET /health (疎通用)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::handlers::{health::health, index::index, verify::verify};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/verify", post(verify))
        .route("/health", get(health))
}
