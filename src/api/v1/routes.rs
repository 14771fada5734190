/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - role 要件はサブルーターごとに宣言する ({admin} / {investor} / {admin, investor})
 */
use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::auth::guard;
use crate::services::auth::Role;
use crate::state::AppState;

use crate::api::v1::handlers::{
    admin::{create_payment, list_investors, list_payments, update_investor},
    auth::{current_session, forgot_password, login, logout, reset_password, signup},
    investor::{mark_notification_read, my_notifications, my_payments, my_profile},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password));

    let any_role = guard::api(
        Router::new().route("/auth/session", get(current_session)),
        state.clone(),
        Role::ANY,
    );

    let admin = guard::api(
        Router::new()
            .route("/admin/investors", get(list_investors))
            .route("/admin/investors/{user_id}", patch(update_investor))
            .route("/admin/payments", get(list_payments).post(create_payment)),
        state.clone(),
        Role::ADMIN,
    );

    let investor = guard::api(
        Router::new()
            .route("/investor/profile", get(my_profile))
            .route("/investor/payments", get(my_payments))
            .route("/investor/notifications", get(my_notifications))
            .route(
                "/investor/notifications/{notification_id}/read",
                post(mark_notification_read),
            ),
        state,
        Role::INVESTOR,
    );

    public.merge(any_role).merge(admin).merge(investor)
}
