/*
 * Responsibility
 * - /auth 系 handler (signup / login / logout / forgot / reset / session)
 * - cookie の読み書きは AuthService 経由のみ (canonical cookie 名を一箇所に)
 */
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    api::v1::{
        dto::auth::{
            FORGOT_PASSWORD_MESSAGE, ForgotPasswordRequest, IdentityResponse, LoginRequest,
            MessageResponse, ResetPasswordRequest, SessionResponse, SignupRequest,
            normalize_email,
        },
        extractors::CurrentSession,
    },
    error::AppError,
    state::AppState,
};

fn invalid(message: &'static str) -> AppError {
    AppError::bad_request("INVALID_REQUEST", message)
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<IdentityResponse>), AppError> {
    req.validate().map_err(invalid)?;

    let email = normalize_email(&req.email);
    let full_name = req.full_name.as_deref().map(str::trim);
    let identity = state
        .accounts
        .signup(&email, &req.password, full_name)
        .await?;

    let jar = state
        .auth
        .issue_session(jar, identity.user_id, &identity.email, identity.role)?;

    Ok((StatusCode::CREATED, jar, Json(identity.into())))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<IdentityResponse>), AppError> {
    req.validate().map_err(invalid)?;

    let email = normalize_email(&req.email);
    let identity = state.accounts.login(&email, &req.password).await?;

    let jar = state
        .auth
        .issue_session(jar, identity.user_id, &identity.email, identity.role)?;

    Ok((jar, Json(identity.into())))
}

/// Needs no session: clearing an absent cookie is harmless.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        state.auth.end_session(jar),
        Json(MessageResponse::new("logged out")),
    )
}

pub async fn current_session(CurrentSession(session): CurrentSession) -> Json<SessionResponse> {
    Json(session.into())
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email);
    if !email.is_empty() {
        state.resets.request_reset(&email).await?;
    }

    // Same answer whether or not the account exists.
    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate().map_err(invalid)?;

    state
        .resets
        .reset_password(req.token.trim(), &req.password)
        .await?;

    Ok(Json(MessageResponse::new("password has been reset")))
}
