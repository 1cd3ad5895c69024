pub mod admin;
pub mod auth;
pub mod manager;
pub mod notifications;
pub mod superadmin;
pub mod tickets;
