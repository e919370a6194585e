pub mod lifecycle;
pub mod otp_gate;
pub mod refunds;
pub mod reminders;
pub mod schedule;
pub mod wallet;
