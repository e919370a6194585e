pub mod bookings;
pub mod reminders;
pub mod wallets;
