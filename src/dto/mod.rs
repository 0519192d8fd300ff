pub mod addresses;
pub mod assessments;
pub mod bookings;
pub mod checkout;
pub mod services;
pub mod webhook;
