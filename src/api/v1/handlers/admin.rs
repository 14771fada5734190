/*
 * Responsibility
 * - admin 専用 handler (investor 一覧・更新、payment の記録と一覧)
 * - ルーティング側で {admin} の guard が掛かっている前提
 */
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::{
            investors::{InvestorResponse, UpdateInvestorRequest},
            payments::{CreatePaymentRequest, ListQuery, PaymentResponse, format_amount},
        },
        extractors::CurrentSession,
    },
    error::AppError,
    repos::{
        payment_repo::{self, NewPayment},
        profile_repo,
    },
    services::auth::Role,
    state::AppState,
};

pub async fn list_investors(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvestorResponse>>, AppError> {
    let rows = profile_repo::list_investors(&state.db).await?;
    Ok(Json(rows.into_iter().map(InvestorResponse::from).collect()))
}

pub async fn update_investor(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateInvestorRequest>,
) -> Result<Json<InvestorResponse>, AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_REQUEST", m))?;

    let row = profile_repo::update_investor(&state.db, user_id, req.changes())
        .await?
        .ok_or(AppError::not_found("investor"))?;

    tracing::info!(admin_id = %session.subject_id, investor_id = %user_id, "investor profile updated");

    Ok(Json(row.into()))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let rows = payment_repo::list_all(&state.db, q.limit(), q.offset()).await?;
    Ok(Json(rows.into_iter().map(PaymentResponse::from).collect()))
}

pub async fn create_payment(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_REQUEST", m))?;

    let investor = profile_repo::get(&state.db, req.investor_id)
        .await?
        .filter(|p| p.role == Role::Investor.as_str())
        .ok_or(AppError::not_found("investor"))?;

    let currency = req.currency();
    let body = format!(
        "A payment of {} {} dated {} has been recorded.",
        format_amount(req.amount_cents),
        currency,
        req.paid_on
    );

    let row = payment_repo::record_with_notification(
        &state.db,
        NewPayment {
            investor_id: investor.user_id,
            amount_cents: req.amount_cents,
            currency,
            paid_on: req.paid_on,
            note: req.note.as_deref(),
        },
        "Payment received",
        &body,
    )
    .await?;

    tracing::info!(
        admin_id = %session.subject_id,
        investor_id = %investor.user_id,
        payment_id = %row.id,
        "payment recorded"
    );

    Ok((StatusCode::CREATED, Json(row.into())))
}
