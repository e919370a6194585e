use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::{enums::otp_types::OtpType, service_flow::OtpConsume};

#[async_trait]
#[automock]
pub trait ServiceOtpRepository: Send + Sync {
    /// Marks any prior unused code of the same (booking, type) as used and
    /// inserts the new one, in a single transaction. At most one active code
    /// per type per booking can therefore exist.
    async fn supersede_and_issue(
        &self,
        booking_id: Uuid,
        otp_type: OtpType,
        code: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid>;

    /// Verify-and-consume as one conditional update guarded by
    /// `used = false`; two concurrent attempts can never both succeed.
    async fn consume(
        &self,
        booking_id: Uuid,
        otp_type: OtpType,
        submitted_code: &str,
        now: DateTime<Utc>,
        enforce_expiry: bool,
    ) -> Result<OtpConsume>;
}
