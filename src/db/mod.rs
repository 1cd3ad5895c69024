pub mod db;
pub mod notificationdb;
pub mod sladb;
pub mod statsdb;
pub mod ticketdb;
pub mod userdb;
