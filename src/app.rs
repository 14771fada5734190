/*
 * Responsibility
 * - tracing / panic hook 初期化
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (HTTP / CORS / guard はサブルーター側)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware;
use crate::repos::user_repo::{PgUserRepo, UserStore};
use crate::services::account::AccountService;
use crate::services::auth::AuthService;
use crate::services::auth::cookie_store::SessionCookies;
use crate::services::auth::password_reset::{
    LogResetNotifier, PasswordResetService, ResetNotifier,
};
use crate::services::auth::token_codec::TokenCodec;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,bike_invest=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();

    // Fails here (before binding) when JWT_SECRET or DATABASE_URL is missing.
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting bike-invest in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connecting to database")?;

    let state = build_state(&config, db);
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app).await.context("serving http")?;

    Ok(())
}

fn build_state(config: &Config, db: PgPool) -> AppState {
    let users: Arc<dyn UserStore> = Arc::new(PgUserRepo::new(db.clone()));
    let notifier: Arc<dyn ResetNotifier> =
        Arc::new(LogResetNotifier::new(!config.app_env.is_production()));

    build_state_with(config, db, users, notifier)
}

/// Wire process-level services; the store and notifier are injected.
pub fn build_state_with(
    config: &Config,
    db: PgPool,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn ResetNotifier>,
) -> AppState {
    let codec = Arc::new(TokenCodec::new(
        &config.jwt_secret,
        config.token_leeway_seconds,
    ));
    let cookies = SessionCookies::new(config.app_env.is_production());

    let auth = Arc::new(AuthService::new(
        codec.clone(),
        cookies,
        config.session_ttl_seconds,
    ));
    let accounts = Arc::new(AccountService::new(users.clone()));
    let resets = Arc::new(PasswordResetService::new(
        users,
        codec,
        notifier,
        config.reset_token_ttl_seconds,
        config.public_base_url.clone(),
    ));

    AppState::new(db, auth, accounts, resets)
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .merge(api::pages::routes(state.clone()))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}
