use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::wallets::{WalletEntity, WalletTransactionEntity};

#[async_trait]
#[automock]
pub trait WalletRepository: Send + Sync {
    async fn find_wallet(&self, sitter_id: Uuid) -> Result<Option<WalletEntity>>;

    async fn list_transactions(&self, sitter_id: Uuid) -> Result<Vec<WalletTransactionEntity>>;
}
