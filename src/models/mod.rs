pub mod notificationmodel;
pub mod slamodel;
pub mod ticketmodel;
pub mod usermodel;
