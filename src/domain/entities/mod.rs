pub mod bookings;
pub mod cancellation_policies;
pub mod payment_refunds;
pub mod service_otps;
pub mod wallets;
