use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::{prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::bookings::BookingEntity,
        repositories::service_flow::ServiceFlowRepository,
        value_objects::{
            enums::{booking_statuses::BookingStatus, otp_types::OtpType},
            service_flow::{BeginOutcome, CancelOutcome, CompletionOutcome, OtpConsume},
            wallets::CreditOutcome,
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{service_otps::consume_in_tx, wallets::credit_earning_in_tx},
        schema::bookings,
    },
};

/// All state-machine writes go through one row lock per transition, so two
/// concurrent requests serialize on the booking row and exactly one of them
/// sees the startable/ongoing state.
pub struct ServiceFlowPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ServiceFlowPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

fn lock_booking(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<Option<BookingEntity>, diesel::result::Error> {
    bookings::table
        .find(booking_id)
        .select(BookingEntity::as_select())
        .for_update()
        .first::<BookingEntity>(conn)
        .optional()
}

#[async_trait]
impl ServiceFlowRepository for ServiceFlowPostgres {
    async fn begin_service(
        &self,
        booking_id: Uuid,
        submitted_code: &str,
        now: DateTime<Utc>,
        enforce_expiry: bool,
    ) -> Result<BeginOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<BeginOutcome, diesel::result::Error, _>(|tx| {
            let Some(booking) = lock_booking(tx, booking_id)? else {
                return Ok(BeginOutcome::StateConflict(
                    "booking no longer exists".to_string(),
                ));
            };

            let status = BookingStatus::from_str(&booking.status).unwrap_or_default();
            if !status.is_startable() {
                return Ok(BeginOutcome::StateConflict(format!(
                    "cannot start service from {status}"
                )));
            }

            match consume_in_tx(
                tx,
                booking_id,
                OtpType::Start,
                submitted_code,
                now,
                enforce_expiry,
            )? {
                OtpConsume::Consumed => {}
                OtpConsume::Expired => return Ok(BeginOutcome::OtpExpired),
                OtpConsume::NotFound => return Ok(BeginOutcome::OtpInvalid),
            }

            update(bookings::table.find(booking_id))
                .set((
                    bookings::status.eq(BookingStatus::Ongoing.to_string()),
                    bookings::actual_started_at.eq(Some(now)),
                    bookings::updated_at.eq(now),
                ))
                .execute(tx)?;

            Ok(BeginOutcome::Started)
        })?;

        Ok(outcome)
    }

    async fn complete_service(
        &self,
        booking_id: Uuid,
        submitted_code: &str,
        now: DateTime<Utc>,
        enforce_expiry: bool,
        maturation_days: i64,
    ) -> Result<CompletionOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<CompletionOutcome, diesel::result::Error, _>(|tx| {
            let Some(booking) = lock_booking(tx, booking_id)? else {
                return Ok(CompletionOutcome::StateConflict(
                    "booking no longer exists".to_string(),
                ));
            };

            let status = BookingStatus::from_str(&booking.status).unwrap_or_default();
            if status != BookingStatus::Ongoing {
                return Ok(CompletionOutcome::StateConflict(format!(
                    "cannot complete service from {status}"
                )));
            }

            match consume_in_tx(
                tx,
                booking_id,
                OtpType::End,
                submitted_code,
                now,
                enforce_expiry,
            )? {
                OtpConsume::Consumed => {}
                OtpConsume::Expired => return Ok(CompletionOutcome::OtpExpired),
                OtpConsume::NotFound => return Ok(CompletionOutcome::OtpInvalid),
            }

            // Whole minutes, fractional remainder dropped.
            let actual_duration_minutes = booking
                .actual_started_at
                .map(|started| (now - started).num_minutes().max(0) as i32)
                .unwrap_or(0);

            // The wallet credit rides in the same transaction as the status
            // write; `wallet_credited` flips only when a credit landed.
            let wallet_transaction_id = match booking.sitter_id {
                Some(sitter_id) => {
                    let credited = credit_earning_in_tx(
                        tx,
                        sitter_id,
                        booking_id,
                        booking.total_amount_minor,
                        &format!("Earning for booking {booking_id}"),
                        now + Duration::days(maturation_days),
                    )?;
                    match credited {
                        CreditOutcome::Credited(transaction_id) => Some(transaction_id),
                        CreditOutcome::Duplicate => None,
                    }
                }
                None => None,
            };

            update(bookings::table.find(booking_id))
                .set((
                    bookings::status.eq(BookingStatus::Completed.to_string()),
                    bookings::actual_ended_at.eq(Some(now)),
                    bookings::actual_duration_minutes.eq(Some(actual_duration_minutes)),
                    bookings::wallet_credited
                        .eq(booking.wallet_credited || wallet_transaction_id.is_some()),
                    bookings::updated_at.eq(now),
                ))
                .execute(tx)?;

            Ok(CompletionOutcome::Completed {
                actual_duration_minutes,
                wallet_transaction_id,
            })
        })?;

        Ok(outcome)
    }

    async fn cancel_booking(
        &self,
        booking_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<CancelOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<CancelOutcome, diesel::result::Error, _>(|tx| {
            let Some(booking) = lock_booking(tx, booking_id)? else {
                return Ok(CancelOutcome::StateConflict(
                    "booking no longer exists".to_string(),
                ));
            };

            let status = BookingStatus::from_str(&booking.status).unwrap_or_default();
            if !status.is_cancellable() {
                return Ok(CancelOutcome::StateConflict(format!(
                    "booking is {status}"
                )));
            }

            update(bookings::table.find(booking_id))
                .set((
                    bookings::status.eq(BookingStatus::UserCancelled.to_string()),
                    bookings::cancellation_reason.eq(Some(reason.to_string())),
                    bookings::updated_at.eq(now),
                ))
                .execute(tx)?;

            Ok(CancelOutcome::Cancelled)
        })?;

        Ok(outcome)
    }
}
