use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::bookings::{BookingEntity, InsertBookingEntity},
        repositories::bookings::BookingRepository,
        value_objects::enums::payment_statuses::PaymentStatus,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn create_booking(&self, insert_booking_entity: InsertBookingEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let booking_id = insert_into(bookings::table)
            .values(&insert_booking_entity)
            .returning(bookings::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(booking_id)
    }

    async fn create_recurring_booking(
        &self,
        parent: InsertBookingEntity,
        sessions: Vec<InsertBookingEntity>,
    ) -> Result<(Uuid, Vec<Uuid>)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<(Uuid, Vec<Uuid>), diesel::result::Error, _>(|tx| {
            let parent_id: Uuid = insert_into(bookings::table)
                .values(&parent)
                .returning(bookings::id)
                .get_result::<Uuid>(tx)?;

            let mut session_ids = Vec::with_capacity(sessions.len());
            for mut session in sessions {
                session.parent_booking_id = Some(parent_id);
                let session_id: Uuid = insert_into(bookings::table)
                    .values(&session)
                    .returning(bookings::id)
                    .get_result::<Uuid>(tx)?;
                session_ids.push(session_id);
            }

            Ok((parent_id, session_ids))
        })?;

        Ok(result)
    }

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let booking = bookings::table
            .find(booking_id)
            .select(BookingEntity::as_select())
            .first::<BookingEntity>(&mut conn)
            .optional()?;

        Ok(booking)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Top-level rows only; sessions are reached through their parent.
        let results = bookings::table
            .select(BookingEntity::as_select())
            .filter(bookings::owner_id.eq(owner_id))
            .filter(bookings::parent_booking_id.is_null())
            .order(bookings::scheduled_at.desc())
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_sessions(&self, parent_booking_id: Uuid) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = bookings::table
            .select(BookingEntity::as_select())
            .filter(bookings::parent_booking_id.eq(parent_booking_id))
            .order(bookings::sequence_number.asc())
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_refunded(&self, booking_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(bookings::table.find(booking_id))
            .set((
                bookings::payment_status.eq(PaymentStatus::Refunded.to_string()),
                bookings::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
