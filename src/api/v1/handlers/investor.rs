/*
 * Responsibility
 * - investor 本人向け handler (profile / payments / notifications)
 * - 対象ユーザーは常にセッションの subject_id (パスから受け取らない)
 */
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::{
            investors::InvestorResponse,
            payments::{NotificationResponse, PaymentResponse},
        },
        extractors::CurrentSession,
    },
    error::AppError,
    repos::{notification_repo, payment_repo, profile_repo},
    state::AppState,
};

pub async fn my_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<InvestorResponse>, AppError> {
    let row = profile_repo::get(&state.db, session.subject_id)
        .await?
        .ok_or(AppError::not_found("profile"))?;

    Ok(Json(row.into()))
}

pub async fn my_payments(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let rows = payment_repo::list_for_investor(&state.db, session.subject_id).await?;
    Ok(Json(rows.into_iter().map(PaymentResponse::from).collect()))
}

pub async fn my_notifications(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let rows = notification_repo::list_for_user(&state.db, session.subject_id).await?;
    Ok(Json(rows.into_iter().map(NotificationResponse::from).collect()))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<NotificationResponse>, AppError> {
    let row = notification_repo::mark_read(&state.db, session.subject_id, notification_id)
        .await?
        .ok_or(AppError::not_found("notification"))?;

    Ok(Json(row.into()))
}
