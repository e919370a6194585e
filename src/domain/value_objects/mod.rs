pub mod bookings;
pub mod enums;
pub mod recurrence;
pub mod refunds;
pub mod schedule_time;
pub mod service_flow;
pub mod wallets;
