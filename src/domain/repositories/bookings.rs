use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::bookings::{BookingEntity, InsertBookingEntity};

#[async_trait]
#[automock]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, insert_booking_entity: InsertBookingEntity) -> Result<Uuid>;

    /// Inserts the recurring parent and all of its sessions in one
    /// transaction; the implementation wires `parent_booking_id` into each
    /// session row. Returns (parent_id, session_ids in sequence order).
    async fn create_recurring_booking(
        &self,
        parent: InsertBookingEntity,
        sessions: Vec<InsertBookingEntity>,
    ) -> Result<(Uuid, Vec<Uuid>)>;

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<BookingEntity>>;

    /// Sessions of a recurring parent, ordered by sequence number.
    async fn list_sessions(&self, parent_booking_id: Uuid) -> Result<Vec<BookingEntity>>;

    /// Flips `payment_status` to refunded once the gateway accepts the
    /// refund. Runs outside the cancellation transaction.
    async fn mark_refunded(&self, booking_id: Uuid) -> Result<()>;
}
