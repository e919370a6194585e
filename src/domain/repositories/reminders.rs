use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::bookings::BookingEntity;

#[async_trait]
#[automock]
pub trait ReminderRepository: Send + Sync {
    /// Active bookings scheduled inside `[window_from, window_to)` that have
    /// not yet been reminded under `reminder_rule`.
    async fn list_due(
        &self,
        reminder_rule: &str,
        window_from: DateTime<Utc>,
        window_to: DateTime<Utc>,
    ) -> Result<Vec<BookingEntity>>;

    /// Claims the (booking, rule) pair with an insert-if-absent. Returns
    /// false when another sweep already claimed it, which is what makes the
    /// sweep re-entrant without duplicate sends.
    async fn try_mark_sent(&self, booking_id: Uuid, reminder_rule: &str) -> Result<bool>;
}
