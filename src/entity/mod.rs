pub mod addresses;
pub mod audit_logs;
pub mod bookings;
pub mod custom_assessments;
pub mod profiles;
pub mod services;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use custom_assessments::Entity as CustomAssessments;
pub use profiles::Entity as Profiles;
pub use services::Entity as Services;
