use std::{collections::HashMap, sync::Arc};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        notify::{NotificationRequest, NotificationSender},
        usecases::{
            otp_gate::{OtpError, OtpGate},
            refunds::{RefundEngine, RefundError},
            schedule,
        },
    },
    domain::{
        entities::{bookings::InsertBookingEntity, payment_refunds::InsertPaymentRefundEntity},
        repositories::{
            bookings::BookingRepository, cancellation_policies::CancellationPolicyRepository,
            payment_refunds::PaymentRefundRepository, service_flow::ServiceFlowRepository,
            service_otps::ServiceOtpRepository,
        },
        value_objects::{
            bookings::{
                BookingCreatedModel, BookingDetailModel, BookingModel, CancelBookingModel,
                CompletionModel, CreateBookingModel, ServiceTransitionModel,
            },
            enums::{
                booking_statuses::BookingStatus, otp_types::OtpType,
                payment_statuses::PaymentStatus, refund_statuses::RefundStatus,
            },
            recurrence::RecurrencePattern,
            refunds::{CancellationModel, RefundComputation, RefundOutcomeModel},
            schedule_time,
            service_flow::{BeginOutcome, CancelOutcome, CompletionOutcome},
        },
    },
};

/// Cancellations this close to the scheduled start are rejected outright.
pub const CANCEL_CUTOFF_HOURS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRefund {
    pub refund_id: String,
    pub raw_response: serde_json::Value,
}

/// Outbound refund call to the payment provider. Kept behind a trait so the
/// coordinator can be tested without network access.
#[async_trait]
#[automock]
pub trait PaymentGateway: Send + Sync {
    async fn create_refund(
        &self,
        payment_reference: &str,
        amount_minor: i64,
        notes: HashMap<String, String>,
    ) -> AnyResult<GatewayRefund>;
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("booking not found")]
    NotFound,
    #[error("booking does not belong to the requester")]
    Forbidden,
    #[error("invalid booking request: {0}")]
    Validation(String),
    #[error("booking cannot be cancelled from status {0}")]
    NotCancellable(String),
    #[error("bookings starting within 2 hours cannot be cancelled")]
    WithinCutoff,
    #[error("recurring bookings are cancelled per session, not as a whole")]
    RecurringParent,
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("verification code expired")]
    OtpExpired,
    #[error("invalid verification code")]
    OtpInvalid,
    #[error("no active cancellation policy configured")]
    NoActivePolicy,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LifecycleError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            LifecycleError::NotFound => StatusCode::NOT_FOUND,
            LifecycleError::Forbidden => StatusCode::FORBIDDEN,
            LifecycleError::Validation(_) => StatusCode::BAD_REQUEST,
            LifecycleError::NotCancellable(_)
            | LifecycleError::WithinCutoff
            | LifecycleError::RecurringParent
            | LifecycleError::InvalidTransition(_)
            | LifecycleError::OtpExpired
            | LifecycleError::OtpInvalid => StatusCode::CONFLICT,
            LifecycleError::NoActivePolicy | LifecycleError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<OtpError> for LifecycleError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::Expired => LifecycleError::OtpExpired,
            OtpError::Invalid => LifecycleError::OtpInvalid,
            OtpError::Internal(err) => LifecycleError::Internal(err),
        }
    }
}

impl From<RefundError> for LifecycleError {
    fn from(err: RefundError) -> Self {
        match err {
            RefundError::NoActivePolicy => LifecycleError::NoActivePolicy,
            RefundError::Internal(err) => LifecycleError::Internal(err),
        }
    }
}

/// Coordinates the booking state machine end to end: creation (including
/// recurring expansion), the OTP-gated start/end transitions, cancellation
/// with refund dispatch, and the owner-facing reads.
pub struct LifecycleUseCase<B, F, C, O, R, G>
where
    B: BookingRepository + 'static,
    F: ServiceFlowRepository + 'static,
    C: CancellationPolicyRepository + 'static,
    O: ServiceOtpRepository + 'static,
    R: PaymentRefundRepository + 'static,
    G: PaymentGateway + 'static,
{
    booking_repo: Arc<B>,
    flow_repo: Arc<F>,
    refund_engine: RefundEngine<C>,
    otp_gate: OtpGate<O>,
    refund_repo: Arc<R>,
    gateway: Arc<G>,
    notifier: Arc<dyn NotificationSender>,
    wallet_maturation_days: i64,
}

impl<B, F, C, O, R, G> LifecycleUseCase<B, F, C, O, R, G>
where
    B: BookingRepository + 'static,
    F: ServiceFlowRepository + 'static,
    C: CancellationPolicyRepository + 'static,
    O: ServiceOtpRepository + 'static,
    R: PaymentRefundRepository + 'static,
    G: PaymentGateway + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        booking_repo: Arc<B>,
        flow_repo: Arc<F>,
        refund_engine: RefundEngine<C>,
        otp_gate: OtpGate<O>,
        refund_repo: Arc<R>,
        gateway: Arc<G>,
        notifier: Arc<dyn NotificationSender>,
        wallet_maturation_days: i64,
    ) -> Self {
        Self {
            booking_repo,
            flow_repo,
            refund_engine,
            otp_gate,
            refund_repo,
            gateway,
            notifier,
            wallet_maturation_days,
        }
    }

    pub async fn create_booking(
        &self,
        owner_id: Uuid,
        model: CreateBookingModel,
    ) -> Result<BookingCreatedModel, LifecycleError> {
        if model.times.is_empty() {
            return Err(LifecycleError::Validation(
                "at least one service time is required".to_string(),
            ));
        }
        if model.duration_minutes <= 0 {
            return Err(LifecycleError::Validation(
                "duration must be positive".to_string(),
            ));
        }
        if model.total_amount_minor <= 0 {
            return Err(LifecycleError::Validation(
                "total amount must be positive".to_string(),
            ));
        }

        let payment_status = match model.payment_option.as_deref() {
            Some("prepaid") => {
                if model.payment_reference.is_none() {
                    return Err(LifecycleError::Validation(
                        "prepaid bookings need a payment reference".to_string(),
                    ));
                }
                PaymentStatus::Paid
            }
            _ => PaymentStatus::Pending,
        };

        let created = if model.recurring {
            self.create_recurring(owner_id, &model, payment_status)
                .await?
        } else {
            self.create_single(owner_id, &model, payment_status).await?
        };

        self.notifier.dispatch(NotificationRequest {
            recipient: owner_id,
            template_key: "booking_created",
            variables: HashMap::from([
                ("booking_id".to_string(), created.booking_id.to_string()),
                (
                    "session_count".to_string(),
                    created.session_ids.len().max(1).to_string(),
                ),
            ]),
        });

        Ok(created)
    }

    async fn create_single(
        &self,
        owner_id: Uuid,
        model: &CreateBookingModel,
        payment_status: PaymentStatus,
    ) -> Result<BookingCreatedModel, LifecycleError> {
        if model.times.len() != 1 {
            return Err(LifecycleError::Validation(
                "a single booking takes exactly one time".to_string(),
            ));
        }

        let scheduled_at = schedule_time::ist_to_utc(model.date, model.times[0]);
        let booking_id = self
            .booking_repo
            .create_booking(InsertBookingEntity {
                owner_id,
                pet_id: model.pet_id,
                service_id: model.service_id,
                sitter_id: None,
                scheduled_at,
                duration_minutes: model.duration_minutes,
                status: BookingStatus::Pending.to_string(),
                total_amount_minor: model.total_amount_minor,
                payment_status: payment_status.to_string(),
                payment_reference: model.payment_reference.clone(),
                is_recurring: false,
                recurrence_pattern: None,
                recurrence_end_date: None,
                parent_booking_id: None,
                sequence_number: None,
            })
            .await
            .map_err(|err| {
                error!(%owner_id, db_error = ?err, "lifecycle: failed to create booking");
                LifecycleError::Internal(err)
            })?;

        info!(%owner_id, %booking_id, "lifecycle: booking created");
        Ok(BookingCreatedModel {
            booking_id,
            session_ids: Vec::new(),
        })
    }

    async fn create_recurring(
        &self,
        owner_id: Uuid,
        model: &CreateBookingModel,
        payment_status: PaymentStatus,
    ) -> Result<BookingCreatedModel, LifecycleError> {
        let pattern_text = model.pattern.as_deref().ok_or_else(|| {
            LifecycleError::Validation("recurring bookings need a pattern".to_string())
        })?;
        let end_date = model.end_date.ok_or_else(|| {
            LifecycleError::Validation("recurring bookings need an end date".to_string())
        })?;
        let pattern: RecurrencePattern = pattern_text
            .parse()
            .map_err(LifecycleError::Validation)?;

        let slots = schedule::generate(model.date, end_date, &pattern, &model.times);
        if slots.is_empty() {
            return Err(LifecycleError::Validation(
                "recurrence pattern yields no sessions in the given range".to_string(),
            ));
        }

        // Per-session price: total split evenly, rounded to whole minor units.
        let session_amount_minor =
            (model.total_amount_minor as f64 / slots.len() as f64).round() as i64;

        let first_at = schedule_time::ist_to_utc(slots[0].date, slots[0].time);
        let parent = InsertBookingEntity {
            owner_id,
            pet_id: model.pet_id,
            service_id: model.service_id,
            sitter_id: None,
            scheduled_at: first_at,
            duration_minutes: model.duration_minutes,
            status: BookingStatus::Pending.to_string(),
            total_amount_minor: model.total_amount_minor,
            payment_status: payment_status.to_string(),
            payment_reference: model.payment_reference.clone(),
            is_recurring: true,
            recurrence_pattern: Some(pattern_text.to_string()),
            recurrence_end_date: Some(end_date),
            parent_booking_id: None,
            sequence_number: None,
        };

        let sessions = slots
            .iter()
            .map(|slot| InsertBookingEntity {
                owner_id,
                pet_id: model.pet_id,
                service_id: model.service_id,
                sitter_id: None,
                scheduled_at: schedule_time::ist_to_utc(slot.date, slot.time),
                duration_minutes: model.duration_minutes,
                status: BookingStatus::Pending.to_string(),
                total_amount_minor: session_amount_minor,
                payment_status: payment_status.to_string(),
                payment_reference: model.payment_reference.clone(),
                is_recurring: false,
                recurrence_pattern: None,
                recurrence_end_date: None,
                // Filled in by the repository once the parent row exists.
                parent_booking_id: None,
                sequence_number: Some(slot.sequence_number),
            })
            .collect::<Vec<_>>();

        let session_count = sessions.len();
        let (booking_id, session_ids) = self
            .booking_repo
            .create_recurring_booking(parent, sessions)
            .await
            .map_err(|err| {
                error!(%owner_id, db_error = ?err, "lifecycle: failed to create recurring booking");
                LifecycleError::Internal(err)
            })?;

        info!(
            %owner_id,
            %booking_id,
            session_count,
            "lifecycle: recurring booking created"
        );
        Ok(BookingCreatedModel {
            booking_id,
            session_ids,
        })
    }

    pub async fn get_booking(
        &self,
        requester_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingDetailModel, LifecycleError> {
        let booking = self.load_for(requester_id, booking_id).await?;

        let sessions = if booking.is_recurring {
            self.booking_repo
                .list_sessions(booking.id)
                .await
                .map_err(|err| {
                    error!(%booking_id, db_error = ?err, "lifecycle: failed to list sessions");
                    LifecycleError::Internal(err)
                })?
                .into_iter()
                .map(BookingModel::from)
                .collect()
        } else {
            Vec::new()
        };

        Ok(BookingDetailModel {
            booking: booking.into(),
            sessions,
        })
    }

    pub async fn list_bookings(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<BookingModel>, LifecycleError> {
        let bookings = self
            .booking_repo
            .list_by_owner(owner_id)
            .await
            .map_err(|err| {
                error!(%owner_id, db_error = ?err, "lifecycle: failed to list bookings");
                LifecycleError::Internal(err)
            })?;

        Ok(bookings.into_iter().map(BookingModel::from).collect())
    }

    /// Issues a fresh start or end code and delivers it to the owner via
    /// notification. The code is never returned over the API.
    pub async fn request_service_otp(
        &self,
        requester_id: Uuid,
        booking_id: Uuid,
        otp_type: OtpType,
    ) -> Result<(), LifecycleError> {
        let booking = self.load_for(requester_id, booking_id).await?;

        if booking.is_recurring {
            return Err(LifecycleError::InvalidTransition(
                "recurring parents have no service flow of their own".to_string(),
            ));
        }

        let status = BookingStatus::from_str(&booking.status).unwrap_or_default();
        let allowed = match otp_type {
            OtpType::Start => status.is_startable(),
            OtpType::End => status == BookingStatus::Ongoing,
        };
        if !allowed {
            return Err(LifecycleError::InvalidTransition(format!(
                "cannot issue a {otp_type} code while the booking is {status}"
            )));
        }

        let code = self.otp_gate.issue(booking_id, otp_type).await?;

        self.notifier.dispatch(NotificationRequest {
            recipient: booking.owner_id,
            template_key: match otp_type {
                OtpType::Start => "service_start_otp",
                OtpType::End => "service_end_otp",
            },
            variables: HashMap::from([
                ("booking_id".to_string(), booking_id.to_string()),
                ("code".to_string(), code),
            ]),
        });

        Ok(())
    }

    pub async fn start_service(
        &self,
        requester_id: Uuid,
        booking_id: Uuid,
        submitted_otp: &str,
    ) -> Result<ServiceTransitionModel, LifecycleError> {
        let booking = self.load_for(requester_id, booking_id).await?;

        if booking.is_recurring {
            return Err(LifecycleError::InvalidTransition(
                "recurring parents have no service flow of their own".to_string(),
            ));
        }
        let status = BookingStatus::from_str(&booking.status).unwrap_or_default();
        if !status.is_startable() {
            return Err(LifecycleError::InvalidTransition(format!(
                "cannot start service from {status}"
            )));
        }

        let outcome = self
            .flow_repo
            .begin_service(
                booking_id,
                submitted_otp,
                Utc::now(),
                self.otp_gate.policy().enforce_expiry,
            )
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "lifecycle: begin_service transaction failed");
                LifecycleError::Internal(err)
            })?;

        match outcome {
            BeginOutcome::Started => {
                info!(%booking_id, "lifecycle: service started");
                self.notifier.dispatch(NotificationRequest {
                    recipient: booking.owner_id,
                    template_key: "service_started",
                    variables: HashMap::from([(
                        "booking_id".to_string(),
                        booking_id.to_string(),
                    )]),
                });
                Ok(ServiceTransitionModel {
                    booking_id,
                    status: BookingStatus::Ongoing,
                })
            }
            BeginOutcome::OtpExpired => Err(LifecycleError::OtpExpired),
            BeginOutcome::OtpInvalid => Err(LifecycleError::OtpInvalid),
            BeginOutcome::StateConflict(detail) => Err(LifecycleError::InvalidTransition(detail)),
        }
    }

    pub async fn complete_service(
        &self,
        requester_id: Uuid,
        booking_id: Uuid,
        submitted_otp: &str,
    ) -> Result<CompletionModel, LifecycleError> {
        let booking = self.load_for(requester_id, booking_id).await?;

        let status = BookingStatus::from_str(&booking.status).unwrap_or_default();
        if status != BookingStatus::Ongoing {
            return Err(LifecycleError::InvalidTransition(format!(
                "cannot complete service from {status}"
            )));
        }

        let outcome = self
            .flow_repo
            .complete_service(
                booking_id,
                submitted_otp,
                Utc::now(),
                self.otp_gate.policy().enforce_expiry,
                self.wallet_maturation_days,
            )
            .await
            .map_err(|err| {
                error!(
                    %booking_id,
                    db_error = ?err,
                    "lifecycle: complete_service transaction failed"
                );
                LifecycleError::Internal(err)
            })?;

        match outcome {
            CompletionOutcome::Completed {
                actual_duration_minutes,
                wallet_transaction_id,
            } => {
                info!(
                    %booking_id,
                    actual_duration_minutes,
                    wallet_credited = wallet_transaction_id.is_some(),
                    "lifecycle: service completed"
                );
                if wallet_transaction_id.is_none() {
                    warn!(%booking_id, "lifecycle: completion without wallet credit (no sitter assigned)");
                }
                self.notifier.dispatch(NotificationRequest {
                    recipient: booking.owner_id,
                    template_key: "service_completed",
                    variables: HashMap::from([(
                        "booking_id".to_string(),
                        booking_id.to_string(),
                    )]),
                });
                Ok(CompletionModel {
                    booking_id,
                    status: BookingStatus::Completed,
                    actual_duration_minutes,
                    wallet_transaction_id,
                })
            }
            CompletionOutcome::OtpExpired => Err(LifecycleError::OtpExpired),
            CompletionOutcome::OtpInvalid => Err(LifecycleError::OtpInvalid),
            CompletionOutcome::StateConflict(detail) => {
                Err(LifecycleError::InvalidTransition(detail))
            }
        }
    }

    /// Owner-initiated cancellation: cutoff check, refund computation, the
    /// transactional status write, then best-effort refund dispatch. A
    /// gateway failure after the local commit degrades the response
    /// (refund_status = failed) instead of unwinding the cancellation.
    pub async fn cancel_booking(
        &self,
        requester_id: Uuid,
        booking_id: Uuid,
        model: CancelBookingModel,
    ) -> Result<CancellationModel, LifecycleError> {
        let booking = self.load_for(requester_id, booking_id).await?;
        if booking.owner_id != requester_id {
            return Err(LifecycleError::Forbidden);
        }
        if booking.is_recurring {
            return Err(LifecycleError::RecurringParent);
        }

        let status = BookingStatus::from_str(&booking.status).unwrap_or_default();
        if !status.is_cancellable() {
            return Err(LifecycleError::NotCancellable(status.to_string()));
        }

        let now = Utc::now();
        let hours = schedule_time::hours_until(booking.scheduled_at, now);
        if hours < CANCEL_CUTOFF_HOURS {
            warn!(
                %booking_id,
                hours_until_service = hours,
                "lifecycle: cancellation rejected inside cutoff"
            );
            return Err(LifecycleError::WithinCutoff);
        }

        let paid_minor = (PaymentStatus::from_str(&booking.payment_status)
            == Some(PaymentStatus::Paid))
        .then_some(booking.total_amount_minor);

        // Computed before the status write so a policy lookup failure leaves
        // the booking untouched.
        let computation = self
            .refund_engine
            .calculate_refund_at(booking.scheduled_at, paid_minor, now)
            .await?;

        match self
            .flow_repo
            .cancel_booking(booking_id, &model.reason, now)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "lifecycle: cancel transaction failed");
                LifecycleError::Internal(err)
            })? {
            CancelOutcome::Cancelled => {}
            CancelOutcome::StateConflict(detail) => {
                return Err(LifecycleError::NotCancellable(detail));
            }
        }

        let refund = if paid_minor.is_some() {
            Some(self.dispatch_refund(&booking, computation).await)
        } else {
            None
        };

        info!(%booking_id, %requester_id, "lifecycle: booking cancelled");
        self.notifier.dispatch(NotificationRequest {
            recipient: booking.owner_id,
            template_key: "booking_cancelled",
            variables: HashMap::from([
                ("booking_id".to_string(), booking_id.to_string()),
                (
                    "refund_amount_minor".to_string(),
                    refund
                        .as_ref()
                        .map(|r| r.computation.refund_amount_minor)
                        .unwrap_or(0)
                        .to_string(),
                ),
            ]),
        });

        Ok(CancellationModel {
            booking_id,
            status: BookingStatus::UserCancelled,
            refund,
        })
    }

    async fn dispatch_refund(
        &self,
        booking: &crate::domain::entities::bookings::BookingEntity,
        computation: RefundComputation,
    ) -> RefundOutcomeModel {
        if computation.refund_amount_minor <= 0 {
            return RefundOutcomeModel {
                computation,
                refund_status: None,
                gateway_refund_id: None,
            };
        }

        let Some(reference) = booking.payment_reference.clone() else {
            error!(
                booking_id = %booking.id,
                "lifecycle: paid booking has no payment reference, refund cannot be dispatched"
            );
            self.record_refund_row(
                booking.id,
                String::new(),
                None,
                computation.refund_amount_minor,
                RefundStatus::Failed,
                Some(serde_json::json!({ "error": "missing payment reference" })),
            )
            .await;
            return RefundOutcomeModel {
                computation,
                refund_status: Some(RefundStatus::Failed),
                gateway_refund_id: None,
            };
        };

        let notes = HashMap::from([
            ("booking_id".to_string(), booking.id.to_string()),
            (
                "refund_percent".to_string(),
                computation.refund_percent.to_string(),
            ),
        ]);

        match self
            .gateway
            .create_refund(&reference, computation.refund_amount_minor, notes)
            .await
        {
            Ok(gateway_refund) => {
                info!(
                    booking_id = %booking.id,
                    gateway_refund_id = %gateway_refund.refund_id,
                    amount_minor = computation.refund_amount_minor,
                    "lifecycle: refund initiated"
                );
                self.record_refund_row(
                    booking.id,
                    reference,
                    Some(gateway_refund.refund_id.clone()),
                    computation.refund_amount_minor,
                    RefundStatus::Initiated,
                    Some(gateway_refund.raw_response),
                )
                .await;
                if let Err(err) = self.booking_repo.mark_refunded(booking.id).await {
                    error!(
                        booking_id = %booking.id,
                        db_error = ?err,
                        "lifecycle: failed to flip payment status to refunded"
                    );
                }
                RefundOutcomeModel {
                    computation,
                    refund_status: Some(RefundStatus::Initiated),
                    gateway_refund_id: Some(gateway_refund.refund_id),
                }
            }
            Err(err) => {
                error!(
                    booking_id = %booking.id,
                    gateway_error = ?err,
                    amount_minor = computation.refund_amount_minor,
                    "lifecycle: refund dispatch failed, keeping cancellation"
                );
                self.record_refund_row(
                    booking.id,
                    reference,
                    None,
                    computation.refund_amount_minor,
                    RefundStatus::Failed,
                    Some(serde_json::json!({ "error": err.to_string() })),
                )
                .await;
                RefundOutcomeModel {
                    computation,
                    refund_status: Some(RefundStatus::Failed),
                    gateway_refund_id: None,
                }
            }
        }
    }

    /// The cancellation is already committed when this runs, so a failed
    /// audit write is logged rather than surfaced.
    async fn record_refund_row(
        &self,
        booking_id: Uuid,
        payment_reference: String,
        gateway_refund_id: Option<String>,
        amount_minor: i64,
        status: RefundStatus,
        gateway_response: Option<serde_json::Value>,
    ) {
        let result = self
            .refund_repo
            .record_refund(InsertPaymentRefundEntity {
                booking_id,
                payment_reference,
                gateway_refund_id,
                amount_minor,
                status: status.to_string(),
                gateway_response,
            })
            .await;

        if let Err(err) = result {
            error!(
                %booking_id,
                db_error = ?err,
                "lifecycle: failed to record refund audit row"
            );
        }
    }

    /// Read-only preview of what a cancellation right now would refund. An
    /// explicit amount overrides what the booking row says was paid.
    pub async fn refund_preview(
        &self,
        requester_id: Uuid,
        booking_id: Uuid,
        amount_minor: Option<i64>,
    ) -> Result<RefundComputation, LifecycleError> {
        let booking = self.load_for(requester_id, booking_id).await?;

        let paid_minor = amount_minor.or_else(|| {
            (PaymentStatus::from_str(&booking.payment_status) == Some(PaymentStatus::Paid))
                .then_some(booking.total_amount_minor)
        });

        Ok(self
            .refund_engine
            .calculate_refund(booking.scheduled_at, paid_minor)
            .await?)
    }

    /// Loads the booking and checks the requester is a party to it (owner or
    /// assigned sitter).
    async fn load_for(
        &self,
        requester_id: Uuid,
        booking_id: Uuid,
    ) -> Result<crate::domain::entities::bookings::BookingEntity, LifecycleError> {
        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "lifecycle: failed to load booking");
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::NotFound)?;

        let is_party =
            booking.owner_id == requester_id || booking.sitter_id == Some(requester_id);
        if !is_party {
            warn!(
                %booking_id,
                %requester_id,
                "lifecycle: requester is not a party to the booking"
            );
            return Err(LifecycleError::Forbidden);
        }

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{
            bookings::BookingEntity,
            cancellation_policies::{CancellationPolicyEntity, CancellationRuleEntity},
        },
        repositories::{
            bookings::MockBookingRepository,
            cancellation_policies::{ActivePolicy, MockCancellationPolicyRepository},
            payment_refunds::MockPaymentRefundRepository,
            service_flow::MockServiceFlowRepository,
            service_otps::MockServiceOtpRepository,
        },
    };
    use crate::application::{
        notify::MockNotificationSender,
        usecases::otp_gate::OtpPolicy,
    };
    use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

    type TestUseCase = LifecycleUseCase<
        MockBookingRepository,
        MockServiceFlowRepository,
        MockCancellationPolicyRepository,
        MockServiceOtpRepository,
        MockPaymentRefundRepository,
        MockPaymentGateway,
    >;

    struct Mocks {
        bookings: MockBookingRepository,
        flow: MockServiceFlowRepository,
        policies: MockCancellationPolicyRepository,
        otps: MockServiceOtpRepository,
        refunds: MockPaymentRefundRepository,
        gateway: MockPaymentGateway,
        notifier: MockNotificationSender,
    }

    impl Mocks {
        fn new() -> Self {
            let mut notifier = MockNotificationSender::new();
            notifier.expect_dispatch().returning(|_| ());
            Self {
                bookings: MockBookingRepository::new(),
                flow: MockServiceFlowRepository::new(),
                policies: MockCancellationPolicyRepository::new(),
                otps: MockServiceOtpRepository::new(),
                refunds: MockPaymentRefundRepository::new(),
                gateway: MockPaymentGateway::new(),
                notifier,
            }
        }

        fn into_usecase(self) -> TestUseCase {
            LifecycleUseCase::new(
                Arc::new(self.bookings),
                Arc::new(self.flow),
                RefundEngine::new(Arc::new(self.policies)),
                OtpGate::new(
                    Arc::new(self.otps),
                    OtpPolicy {
                        ttl_minutes: 10,
                        enforce_expiry: true,
                    },
                ),
                Arc::new(self.refunds),
                Arc::new(self.gateway),
                Arc::new(self.notifier),
                3,
            )
        }
    }

    fn booking(
        owner_id: Uuid,
        status: BookingStatus,
        scheduled_at: DateTime<Utc>,
        paid_minor: Option<i64>,
    ) -> BookingEntity {
        BookingEntity {
            id: Uuid::new_v4(),
            owner_id,
            pet_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            sitter_id: Some(Uuid::new_v4()),
            scheduled_at,
            duration_minutes: 60,
            status: status.to_string(),
            total_amount_minor: paid_minor.unwrap_or(50_000),
            payment_status: if paid_minor.is_some() {
                PaymentStatus::Paid.to_string()
            } else {
                PaymentStatus::Pending.to_string()
            },
            payment_reference: paid_minor.is_some().then(|| "pay_test_123".to_string()),
            cancellation_reason: None,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            parent_booking_id: None,
            sequence_number: None,
            actual_started_at: None,
            actual_ended_at: None,
            actual_duration_minutes: None,
            wallet_credited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn expect_find(bookings: &mut MockBookingRepository, entity: BookingEntity) -> Uuid {
        let id = entity.id;
        bookings
            .expect_find_by_id()
            .returning(move |_| {
                let entity = entity.clone();
                Box::pin(async move { Ok(Some(entity)) })
            });
        id
    }

    /// [>=48h: 100%] [24-48h: 50%] [<24h: 0%]
    fn standard_policy() -> ActivePolicy {
        let policy_id = Uuid::new_v4();
        let rule = |position, min_hours, max_hours, refund_percent| CancellationRuleEntity {
            id: Uuid::new_v4(),
            policy_id,
            position,
            min_hours,
            max_hours,
            refund_percent,
            notes: None,
        };
        ActivePolicy {
            policy: CancellationPolicyEntity {
                id: policy_id,
                name: "standard".to_string(),
                effective_from: Utc::now() - Duration::days(30),
                effective_to: None,
                is_active: true,
                created_at: Utc::now(),
            },
            rules: vec![
                rule(1, Some(48.0), None, 100),
                rule(2, Some(24.0), Some(48.0), 50),
                rule(3, None, Some(24.0), 0),
            ],
        }
    }

    fn create_model(recurring: bool) -> CreateBookingModel {
        CreateBookingModel {
            pet_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            times: vec![NaiveTime::from_hms_opt(9, 0, 0).unwrap()],
            duration_minutes: 60,
            recurring,
            pattern: recurring.then(|| "weekly_1_monday".to_string()),
            end_date: recurring.then(|| NaiveDate::from_ymd_opt(2025, 3, 24).unwrap()),
            total_amount_minor: 100_000,
            payment_option: Some("prepaid".to_string()),
            payment_reference: Some("pay_test_123".to_string()),
        }
    }

    #[tokio::test]
    async fn recurring_booking_splits_total_evenly_across_sessions() {
        let mut mocks = Mocks::new();

        // weekly_1_monday over 2025-03-03..=2025-03-24 is four Mondays.
        mocks
            .bookings
            .expect_create_recurring_booking()
            .withf(|parent, sessions| {
                parent.is_recurring
                    && parent.total_amount_minor == 100_000
                    && sessions.len() == 4
                    && sessions.iter().all(|s| s.total_amount_minor == 25_000)
                    && sessions
                        .iter()
                        .enumerate()
                        .all(|(i, s)| s.sequence_number == Some(i as i32 + 1))
            })
            .returning(|_, sessions| {
                let ids = sessions.iter().map(|_| Uuid::new_v4()).collect();
                Box::pin(async move { Ok((Uuid::new_v4(), ids)) })
            });

        let result = mocks
            .into_usecase()
            .create_booking(Uuid::new_v4(), create_model(true))
            .await
            .unwrap();

        assert_eq!(result.session_ids.len(), 4);
    }

    #[tokio::test]
    async fn recurring_booking_without_pattern_is_rejected() {
        let mocks = Mocks::new();
        let mut model = create_model(true);
        model.pattern = None;

        let result = mocks
            .into_usecase()
            .create_booking(Uuid::new_v4(), model)
            .await;

        assert!(matches!(result, Err(LifecycleError::Validation(_))));
    }

    #[tokio::test]
    async fn booking_without_times_is_rejected() {
        let mocks = Mocks::new();
        let mut model = create_model(false);
        model.times.clear();

        let result = mocks
            .into_usecase()
            .create_booking(Uuid::new_v4(), model)
            .await;

        assert!(matches!(result, Err(LifecycleError::Validation(_))));
    }

    #[tokio::test]
    async fn prepaid_booking_without_reference_is_rejected() {
        let mocks = Mocks::new();
        let mut model = create_model(false);
        model.payment_reference = None;

        let result = mocks
            .into_usecase()
            .create_booking(Uuid::new_v4(), model)
            .await;

        assert!(matches!(result, Err(LifecycleError::Validation(_))));
    }

    #[tokio::test]
    async fn cancel_inside_cutoff_is_rejected_without_any_write() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Confirmed,
            Utc::now() + Duration::minutes(90),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        let result = mocks
            .into_usecase()
            .cancel_booking(
                owner_id,
                booking_id,
                CancelBookingModel {
                    reason: "plans changed".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(LifecycleError::WithinCutoff)));
    }

    #[tokio::test]
    async fn cancel_recurring_parent_is_rejected() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let mut entity = booking(
            owner_id,
            BookingStatus::Confirmed,
            Utc::now() + Duration::hours(72),
            Some(100_000),
        );
        entity.is_recurring = true;
        let booking_id = expect_find(&mut mocks.bookings, entity);

        let result = mocks
            .into_usecase()
            .cancel_booking(
                owner_id,
                booking_id,
                CancelBookingModel {
                    reason: "cancel everything".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(LifecycleError::RecurringParent)));
    }

    #[tokio::test]
    async fn cancel_completed_booking_is_rejected() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Completed,
            Utc::now() + Duration::hours(72),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        let result = mocks
            .into_usecase()
            .cancel_booking(
                owner_id,
                booking_id,
                CancelBookingModel {
                    reason: "too late".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(LifecycleError::NotCancellable(_))));
    }

    #[tokio::test]
    async fn cancel_paid_session_at_30h_refunds_half_and_dispatches_gateway() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();

        // A 250-rupee session (25_000 paise) 30 hours out lands in the
        // 24-48h bucket: refund 12_500, deduction 12_500.
        let entity = booking(
            owner_id,
            BookingStatus::Confirmed,
            Utc::now() + Duration::hours(30),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        let policy = standard_policy();
        mocks
            .policies
            .expect_find_active_policy()
            .returning(move |_| {
                let policy = policy.clone();
                Box::pin(async move { Ok(Some(policy)) })
            });
        mocks
            .flow
            .expect_cancel_booking()
            .withf(move |id, reason, _| *id == booking_id && reason == "plans changed")
            .returning(|_, _, _| Box::pin(async { Ok(CancelOutcome::Cancelled) }));
        mocks
            .gateway
            .expect_create_refund()
            .withf(|reference, amount, _| reference == "pay_test_123" && *amount == 12_500)
            .returning(|_, _, _| {
                Box::pin(async {
                    Ok(GatewayRefund {
                        refund_id: "rfnd_abc".to_string(),
                        raw_response: serde_json::json!({ "id": "rfnd_abc" }),
                    })
                })
            });
        mocks
            .refunds
            .expect_record_refund()
            .withf(|row| {
                row.status == RefundStatus::Initiated.to_string()
                    && row.amount_minor == 12_500
                    && row.gateway_refund_id.as_deref() == Some("rfnd_abc")
            })
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
        mocks
            .bookings
            .expect_mark_refunded()
            .withf(move |id| *id == booking_id)
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let result = mocks
            .into_usecase()
            .cancel_booking(
                owner_id,
                booking_id,
                CancelBookingModel {
                    reason: "plans changed".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(result.status, BookingStatus::UserCancelled);
        let refund = result.refund.unwrap();
        assert_eq!(refund.computation.refund_amount_minor, 12_500);
        assert_eq!(refund.computation.deduction_amount_minor, 12_500);
        assert_eq!(refund.refund_status, Some(RefundStatus::Initiated));
        assert_eq!(refund.gateway_refund_id.as_deref(), Some("rfnd_abc"));
    }

    #[tokio::test]
    async fn gateway_failure_degrades_but_keeps_the_cancellation() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Confirmed,
            Utc::now() + Duration::hours(72),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        let policy = standard_policy();
        mocks
            .policies
            .expect_find_active_policy()
            .returning(move |_| {
                let policy = policy.clone();
                Box::pin(async move { Ok(Some(policy)) })
            });
        mocks
            .flow
            .expect_cancel_booking()
            .returning(|_, _, _| Box::pin(async { Ok(CancelOutcome::Cancelled) }));
        mocks
            .gateway
            .expect_create_refund()
            .returning(|_, _, _| {
                Box::pin(async { Err(anyhow::anyhow!("gateway timeout")) })
            });
        mocks
            .refunds
            .expect_record_refund()
            .withf(|row| {
                row.status == RefundStatus::Failed.to_string() && row.gateway_refund_id.is_none()
            })
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));
        // No mark_refunded expectation: a failed dispatch leaves the payment
        // status untouched, so any call here panics the mock.

        let result = mocks
            .into_usecase()
            .cancel_booking(
                owner_id,
                booking_id,
                CancelBookingModel {
                    reason: "plans changed".to_string(),
                },
            )
            .await
            .unwrap();

        let refund = result.refund.unwrap();
        assert_eq!(refund.refund_status, Some(RefundStatus::Failed));
        assert!(refund.gateway_refund_id.is_none());
    }

    #[tokio::test]
    async fn cancel_unpaid_booking_skips_the_refund_pipeline() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Pending,
            Utc::now() + Duration::hours(72),
            None,
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        // No policy, gateway or refund-row expectations: touching any of
        // them would fail the test.
        mocks
            .flow
            .expect_cancel_booking()
            .returning(|_, _, _| Box::pin(async { Ok(CancelOutcome::Cancelled) }));

        let result = mocks
            .into_usecase()
            .cancel_booking(
                owner_id,
                booking_id,
                CancelBookingModel {
                    reason: "never paid".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(result.refund.is_none());
    }

    #[tokio::test]
    async fn cancel_by_non_owner_is_forbidden() {
        let owner_id = Uuid::new_v4();
        let sitter_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let mut entity = booking(
            owner_id,
            BookingStatus::Confirmed,
            Utc::now() + Duration::hours(72),
            Some(25_000),
        );
        entity.sitter_id = Some(sitter_id);
        let booking_id = expect_find(&mut mocks.bookings, entity);

        // The sitter is a party to the booking but only the owner may cancel.
        let result = mocks
            .into_usecase()
            .cancel_booking(
                sitter_id,
                booking_id,
                CancelBookingModel {
                    reason: "not my call".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(LifecycleError::Forbidden)));
    }

    #[tokio::test]
    async fn start_service_maps_otp_mismatch_to_conflict() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Assigned,
            Utc::now() + Duration::minutes(5),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        mocks
            .flow
            .expect_begin_service()
            .returning(|_, _, _, _| Box::pin(async { Ok(BeginOutcome::OtpInvalid) }));

        let result = mocks
            .into_usecase()
            .start_service(owner_id, booking_id, "000000")
            .await;

        assert!(matches!(result, Err(LifecycleError::OtpInvalid)));
    }

    #[tokio::test]
    async fn start_service_from_ongoing_is_an_invalid_transition() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Ongoing,
            Utc::now() - Duration::minutes(10),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        let result = mocks
            .into_usecase()
            .start_service(owner_id, booking_id, "123456")
            .await;

        assert!(matches!(result, Err(LifecycleError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn complete_service_surfaces_the_wallet_transaction() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Ongoing,
            Utc::now() - Duration::hours(1),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);
        let wallet_tx = Uuid::new_v4();

        mocks
            .flow
            .expect_complete_service()
            .withf(|_, code, _, _, maturation_days| code == "654321" && *maturation_days == 3)
            .returning(move |_, _, _, _, _| {
                Box::pin(async move {
                    Ok(CompletionOutcome::Completed {
                        actual_duration_minutes: 58,
                        wallet_transaction_id: Some(wallet_tx),
                    })
                })
            });

        let result = mocks
            .into_usecase()
            .complete_service(owner_id, booking_id, "654321")
            .await
            .unwrap();

        assert_eq!(result.status, BookingStatus::Completed);
        assert_eq!(result.actual_duration_minutes, 58);
        assert_eq!(result.wallet_transaction_id, Some(wallet_tx));
    }

    #[tokio::test]
    async fn second_completion_attempt_conflicts() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Ongoing,
            Utc::now() - Duration::hours(1),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        mocks.flow.expect_complete_service().returning(|_, _, _, _, _| {
            Box::pin(async {
                Ok(CompletionOutcome::StateConflict(
                    "booking is no longer ongoing".to_string(),
                ))
            })
        });

        let result = mocks
            .into_usecase()
            .complete_service(owner_id, booking_id, "654321")
            .await;

        assert!(matches!(result, Err(LifecycleError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn otp_request_on_completed_booking_is_rejected() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Completed,
            Utc::now() - Duration::hours(2),
            Some(25_000),
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        let result = mocks
            .into_usecase()
            .request_service_otp(owner_id, booking_id, OtpType::Start)
            .await;

        assert!(matches!(result, Err(LifecycleError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn get_booking_for_stranger_is_forbidden() {
        let owner_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        let entity = booking(
            owner_id,
            BookingStatus::Confirmed,
            Utc::now() + Duration::hours(24),
            None,
        );
        let booking_id = expect_find(&mut mocks.bookings, entity);

        let result = mocks
            .into_usecase()
            .get_booking(Uuid::new_v4(), booking_id)
            .await;

        assert!(matches!(result, Err(LifecycleError::Forbidden)));
    }
}
