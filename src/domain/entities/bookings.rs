use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::bookings;

/// One row per single booking, per recurring parent and per recurring
/// session. Sessions carry `parent_booking_id` + `sequence_number`; parent
/// rows have `is_recurring = true` and never move through the state machine
/// themselves.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub pet_id: Uuid,
    pub service_id: Uuid,
    pub sitter_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub total_amount_minor: i64,
    pub payment_status: String,
    pub payment_reference: Option<String>,
    pub cancellation_reason: Option<String>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub parent_booking_id: Option<Uuid>,
    pub sequence_number: Option<i32>,
    pub actual_started_at: Option<DateTime<Utc>>,
    pub actual_ended_at: Option<DateTime<Utc>>,
    pub actual_duration_minutes: Option<i32>,
    pub wallet_credited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub owner_id: Uuid,
    pub pet_id: Uuid,
    pub service_id: Uuid,
    pub sitter_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub total_amount_minor: i64,
    pub payment_status: String,
    pub payment_reference: Option<String>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub parent_booking_id: Option<Uuid>,
    pub sequence_number: Option<i32>,
}
