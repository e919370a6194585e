use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    booking_statuses::BookingStatus, refund_statuses::RefundStatus,
};

/// Result of the refund policy engine. Amounts are minor units (paise).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundComputation {
    pub refund_percent: i32,
    pub refund_amount_minor: i64,
    pub deduction_amount_minor: i64,
    pub hours_until_service: f64,
    pub rule_applied: Option<String>,
}

impl RefundComputation {
    /// Fail-fast result for bookings that were never paid.
    pub fn nothing_to_refund(hours_until_service: f64) -> Self {
        Self {
            refund_percent: 0,
            refund_amount_minor: 0,
            deduction_amount_minor: 0,
            hours_until_service,
            rule_applied: None,
        }
    }
}

/// What actually happened to the money after a cancellation: the computed
/// split plus the outcome of the best-effort gateway dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundOutcomeModel {
    #[serde(flatten)]
    pub computation: RefundComputation,
    /// `None` when no external dispatch was needed (zero refund amount).
    pub refund_status: Option<RefundStatus>,
    pub gateway_refund_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationModel {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub refund: Option<RefundOutcomeModel>,
}
