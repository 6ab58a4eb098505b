/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 各 module は `apply(router, ..) -> Router` を提供する
 */
pub mod cors;
pub mod http;
pub mod security_headers;
