//! HTTP handlers for the payment API
//!
//! Thin layer: deserialize, hand to the engine, wrap the outcome. All
//! business decisions, including the principal/sender check, live in the
//! engine.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::{TopUpRequest, TransferRequest};
use crate::ledger::TransactionRecord;

use super::auth::AuthenticatedUser;
use super::state::AppState;
use super::types::{ok, ApiError, ApiResult};

// --- Requests ---

#[derive(Debug, Deserialize)]
pub struct TopUpApiRequest {
    pub user_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TransferApiRequest {
    pub sender_id: i64,
    pub recipient_id: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

// --- Responses ---

#[derive(Debug, Serialize)]
pub struct TopUpApiResponse {
    pub balance: Decimal,
    pub transaction_id: i64,
}

#[derive(Debug, Serialize)]
pub struct BalanceApiResponse {
    pub user_id: i64,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransferApiResponse {
    pub transaction_id: i64,
    pub sender_balance: Decimal,
}

// --- Handlers ---

/// POST /api/v1/topup
pub async fn top_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TopUpApiRequest>,
) -> ApiResult<TopUpApiResponse> {
    let outcome = state
        .engine
        .top_up(TopUpRequest {
            user_id: req.user_id,
            amount: req.amount,
        })
        .await?;

    ok(TopUpApiResponse {
        balance: outcome.balance,
        transaction_id: outcome.transaction_id,
    })
}

/// GET /api/v1/balance/{user_id}
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<BalanceApiResponse> {
    let balance = state.engine.get_balance(user_id).await?;

    ok(BalanceApiResponse {
        user_id: balance.user_id,
        balance: balance.amount,
    })
}

/// POST /api/v1/transfer (authenticated)
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<TransferApiRequest>,
) -> ApiResult<TransferApiResponse> {
    let outcome = state
        .engine
        .transfer(
            user.user_id,
            TransferRequest {
                sender_id: req.sender_id,
                recipient_id: req.recipient_id,
                amount: req.amount,
                description: req.description,
            },
        )
        .await?;

    ok(TransferApiResponse {
        transaction_id: outcome.transaction_id,
        sender_balance: outcome.sender_balance,
    })
}

/// GET /api/v1/transactions/{user_id}
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> ApiResult<Vec<TransactionRecord>> {
    let records = state.engine.history(user_id).await?;
    ok(records)
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state
        .db
        .health_check()
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Database unhealthy: {}", e)))?;
    ok("healthy")
}
