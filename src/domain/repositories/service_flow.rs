use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::service_flow::{BeginOutcome, CancelOutcome, CompletionOutcome};

/// Transactional state-machine writes. Each method runs its dependent writes
/// (status, OTP consumption, wallet credit, cancellation reason) inside a
/// single database transaction so a crash or a concurrent request can never
/// observe a half-applied transition.
#[async_trait]
#[automock]
pub trait ServiceFlowRepository: Send + Sync {
    /// -> ONGOING: consumes the START code and records actual_started_at.
    async fn begin_service(
        &self,
        booking_id: Uuid,
        submitted_code: &str,
        now: DateTime<Utc>,
        enforce_expiry: bool,
    ) -> Result<BeginOutcome>;

    /// -> COMPLETED: consumes the END code, records actual_ended_at and the
    /// floored duration, and credits the sitter wallet exactly once
    /// (checked-and-set `wallet_credited` guard) in the same transaction.
    async fn complete_service(
        &self,
        booking_id: Uuid,
        submitted_code: &str,
        now: DateTime<Utc>,
        enforce_expiry: bool,
        maturation_days: i64,
    ) -> Result<CompletionOutcome>;

    /// -> USER_CANCELLED: status and cancellation reason committed together.
    async fn cancel_booking(
        &self,
        booking_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome>;
}
