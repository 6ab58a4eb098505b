/*
 * Responsibility
 * - HTTP 層の公開ポイント (routes() の re-export)
 * - URL は `/`, `/verify` 固定 (クライアント側のページがそのまま叩く)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
