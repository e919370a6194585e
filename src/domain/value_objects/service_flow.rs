use uuid::Uuid;

/// Outcome of a single verify-and-consume attempt on a service OTP.
/// `Expired` is deliberately distinct from `NotFound` so the caller can
/// surface a precise reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpConsume {
    Consumed,
    Expired,
    NotFound,
}

/// Result of the transactional PENDING-family -> ONGOING transition.
#[derive(Debug, Clone, PartialEq)]
pub enum BeginOutcome {
    Started,
    OtpExpired,
    OtpInvalid,
    /// The booking was not in a startable state when the transaction ran.
    StateConflict(String),
}

/// Result of the transactional ONGOING -> COMPLETED transition, which also
/// performs the single wallet credit.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Completed {
        actual_duration_minutes: i32,
        wallet_transaction_id: Option<Uuid>,
    },
    OtpExpired,
    OtpInvalid,
    StateConflict(String),
}

/// Result of the transactional cancellation write (status + reason together).
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Cancelled,
    StateConflict(String),
}
