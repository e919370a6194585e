use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::error;

use crate::{
    application::usecases::wallet::{WalletError, WalletLedgerUseCase},
    infrastructure::{
        axum_http::auth::AuthUser,
        postgres::{postgres_connection::PgPoolSquad, repositories::wallets::WalletPostgres},
    },
};

type WalletLedger = WalletLedgerUseCase<WalletPostgres>;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let wallet_repository = WalletPostgres::new(Arc::clone(&db_pool));
    let wallet_usecase = WalletLedgerUseCase::new(Arc::new(wallet_repository));

    Router::new()
        .route("/balance", get(balance))
        .route("/transactions", get(transactions))
        .with_state(Arc::new(wallet_usecase))
}

pub async fn balance(
    State(wallet_usecase): State<Arc<WalletLedger>>,
    user: AuthUser,
) -> Response {
    match wallet_usecase.balance(user.user_id).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(err) => map_error("balance", err),
    }
}

pub async fn transactions(
    State(wallet_usecase): State<Arc<WalletLedger>>,
    user: AuthUser,
) -> Response {
    match wallet_usecase.transactions(user.user_id).await {
        Ok(transactions) => (StatusCode::OK, Json(transactions)).into_response(),
        Err(err) => map_error("transactions", err),
    }
}

fn map_error(label: &str, err: WalletError) -> Response {
    let status = err.status_code();
    let message = match &err {
        WalletError::Internal(_) => "Internal server error".to_string(),
        other => other.to_string(),
    };

    error!(
        status = status.as_u16(),
        error = %err,
        "wallet: {} failed",
        label
    );
    (status, message).into_response()
}
