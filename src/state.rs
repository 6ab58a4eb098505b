/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - verification: token 検証サービス, landing_page: 起動時に描画済みの GET / ページ
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::TokenVerificationService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub verification: Arc<TokenVerificationService>,
    pub landing_page: Arc<str>,
}

impl AppState {
    pub fn new(
        verification: Arc<TokenVerificationService>,
        landing_page: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            verification,
            landing_page: landing_page.into(),
        }
    }
}
