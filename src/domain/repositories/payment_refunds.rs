use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payment_refunds::InsertPaymentRefundEntity;

#[async_trait]
#[automock]
pub trait PaymentRefundRepository: Send + Sync {
    /// Records the outcome of a refund dispatch, successful or not. Failed
    /// dispatches are kept for manual reconciliation.
    async fn record_refund(&self, refund: InsertPaymentRefundEntity) -> Result<Uuid>;
}
