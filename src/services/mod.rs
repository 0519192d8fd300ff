pub mod address_service;
pub mod assessment_service;
pub mod booking_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod profile_service;
pub mod webhook_service;
