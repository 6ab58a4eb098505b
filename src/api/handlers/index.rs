/*
 * Responsibility
 * - GET / : 起動時に描画済みのページを返すだけ
 */
use axum::{extract::State, response::Html};

use crate::state::AppState;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.landing_page.to_string())
}
