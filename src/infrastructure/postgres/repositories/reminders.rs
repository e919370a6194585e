use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*};
use uuid::Uuid;

use crate::{
    domain::{
        entities::bookings::BookingEntity, repositories::reminders::ReminderRepository,
        value_objects::enums::booking_statuses::BookingStatus,
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{booking_reminders, bookings},
    },
};

pub struct ReminderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ReminderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ReminderRepository for ReminderPostgres {
    async fn list_due(
        &self,
        reminder_rule: &str,
        window_from: DateTime<Utc>,
        window_to: DateTime<Utc>,
    ) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let sent_ids = booking_reminders::table
            .select(booking_reminders::booking_id)
            .filter(booking_reminders::reminder_rule.eq(reminder_rule));

        // Recurring parents never receive reminders themselves; each session
        // row is its own reminder target.
        let results = bookings::table
            .select(BookingEntity::as_select())
            .filter(bookings::scheduled_at.ge(window_from))
            .filter(bookings::scheduled_at.lt(window_to))
            .filter(bookings::is_recurring.eq(false))
            .filter(bookings::status.ne_all(vec![
                BookingStatus::Completed.to_string(),
                BookingStatus::UserCancelled.to_string(),
            ]))
            .filter(bookings::id.ne_all(sent_ids))
            .order(bookings::scheduled_at.asc())
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn try_mark_sent(&self, booking_id: Uuid, reminder_rule: &str) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Insert-if-absent on the composite key is the claim; losing the
        // race means someone else already sent this reminder.
        let inserted = insert_into(booking_reminders::table)
            .values((
                booking_reminders::booking_id.eq(booking_id),
                booking_reminders::reminder_rule.eq(reminder_rule),
                booking_reminders::sent_at.eq(Utc::now()),
            ))
            .on_conflict((booking_reminders::booking_id, booking_reminders::reminder_rule))
            .do_nothing()
            .execute(&mut conn)?;

        Ok(inserted > 0)
    }
}
