pub mod booking_statuses;
pub mod otp_types;
pub mod payment_statuses;
pub mod refund_statuses;
pub mod wallet_transactions;
