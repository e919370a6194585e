use std::sync::Arc;

use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::domain::{
    repositories::wallets::WalletRepository,
    value_objects::wallets::{WalletBalanceModel, WalletTransactionModel},
};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet not found")]
    WalletNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WalletError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            WalletError::WalletNotFound => StatusCode::NOT_FOUND,
            WalletError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Read side of the sitter ledger. Earnings are credited inside the service
/// completion transaction; this component only reports balances and history.
pub struct WalletLedgerUseCase<W>
where
    W: WalletRepository + 'static,
{
    wallet_repo: Arc<W>,
}

impl<W> WalletLedgerUseCase<W>
where
    W: WalletRepository + 'static,
{
    pub fn new(wallet_repo: Arc<W>) -> Self {
        Self { wallet_repo }
    }

    pub async fn balance(&self, sitter_id: Uuid) -> Result<WalletBalanceModel, WalletError> {
        let wallet = self
            .wallet_repo
            .find_wallet(sitter_id)
            .await
            .map_err(|err| {
                error!(%sitter_id, db_error = ?err, "wallet: failed to load wallet");
                WalletError::Internal(err)
            })?
            .ok_or(WalletError::WalletNotFound)?;

        Ok(WalletBalanceModel::from(wallet))
    }

    pub async fn transactions(
        &self,
        sitter_id: Uuid,
    ) -> Result<Vec<WalletTransactionModel>, WalletError> {
        let transactions = self
            .wallet_repo
            .list_transactions(sitter_id)
            .await
            .map_err(|err| {
                error!(%sitter_id, db_error = ?err, "wallet: failed to list transactions");
                WalletError::Internal(err)
            })?;

        Ok(transactions
            .into_iter()
            .map(WalletTransactionModel::from)
            .collect())
    }
}
