use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::bookings::BookingEntity,
    value_objects::enums::{booking_statuses::BookingStatus, payment_statuses::PaymentStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingModel {
    pub pet_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    /// One entry for a single booking; one session per (date, time) pair for
    /// recurring bookings.
    pub times: Vec<NaiveTime>,
    pub duration_minutes: i32,
    #[serde(default)]
    pub recurring: bool,
    pub pattern: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub total_amount_minor: i64,
    /// "prepaid" marks the booking paid up front (payment_reference required);
    /// anything else leaves payment pending for the gateway webhook.
    pub payment_option: Option<String>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedModel {
    pub booking_id: Uuid,
    pub session_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingModel {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub pet_id: Uuid,
    pub service_id: Uuid,
    pub sitter_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: BookingStatus,
    pub total_amount_minor: i64,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub cancellation_reason: Option<String>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub parent_booking_id: Option<Uuid>,
    pub sequence_number: Option<i32>,
    pub actual_started_at: Option<DateTime<Utc>>,
    pub actual_ended_at: Option<DateTime<Utc>>,
    pub actual_duration_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<BookingEntity> for BookingModel {
    fn from(entity: BookingEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            pet_id: entity.pet_id,
            service_id: entity.service_id,
            sitter_id: entity.sitter_id,
            scheduled_at: entity.scheduled_at,
            duration_minutes: entity.duration_minutes,
            status: BookingStatus::from_str(&entity.status).unwrap_or_default(),
            total_amount_minor: entity.total_amount_minor,
            payment_status: PaymentStatus::from_str(&entity.payment_status).unwrap_or_default(),
            payment_reference: entity.payment_reference,
            cancellation_reason: entity.cancellation_reason,
            is_recurring: entity.is_recurring,
            recurrence_pattern: entity.recurrence_pattern,
            parent_booking_id: entity.parent_booking_id,
            sequence_number: entity.sequence_number,
            actual_started_at: entity.actual_started_at,
            actual_ended_at: entity.actual_ended_at,
            actual_duration_minutes: entity.actual_duration_minutes,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetailModel {
    #[serde(flatten)]
    pub booking: BookingModel,
    pub sessions: Vec<BookingModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOtpModel {
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingModel {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTransitionModel {
    pub booking_id: Uuid,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionModel {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub actual_duration_minutes: i32,
    pub wallet_transaction_id: Option<Uuid>,
}
