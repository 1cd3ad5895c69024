pub mod error;
pub mod notification_service;
pub mod policy;
pub mod sla_service;
pub mod stats_service;
pub mod ticket_service;
pub mod user_service;
