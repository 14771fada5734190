/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: route guard layer / cors, http: 横断的な transport 設定
 */
pub mod auth;
pub mod cors;
pub mod http;
