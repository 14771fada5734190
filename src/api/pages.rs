/*
 * Responsibility
 * - ブラウザ向けのページ入口 (/login, /admin, /dashboard)
 * - 画面描画は別プロジェクト。ここは guard の redirect 挙動を持つ最小の shell だけ
 */
use axum::{Router, response::Html, routing::get};

use crate::api::v1::extractors::CurrentSession;
use crate::middleware::auth::guard;
use crate::services::auth::Role;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = guard::page(
        Router::new().route("/admin", get(admin_home)),
        state.clone(),
        Role::ADMIN,
    );
    let investor = guard::page(
        Router::new().route("/dashboard", get(investor_home)),
        state,
        Role::INVESTOR,
    );

    Router::new()
        .route("/login", get(login_page))
        .merge(admin)
        .merge(investor)
}

async fn login_page() -> Html<&'static str> {
    Html("<!doctype html><html><head><title>Sign in</title></head><body data-page=\"login\"></body></html>")
}

async fn admin_home(CurrentSession(session): CurrentSession) -> Html<String> {
    shell("admin", &session.email)
}

async fn investor_home(CurrentSession(session): CurrentSession) -> Html<String> {
    shell("dashboard", &session.email)
}

fn shell(page: &str, email: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><title>{page}</title></head><body data-page=\"{page}\" data-user=\"{}\"></body></html>",
        escape_attr(email)
    ))
}

fn escape_attr(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '\'' => "&#39;".to_string(),
            other => other.to_string(),
        })
        .collect()
}
