pub mod statsdtos;
pub mod ticketdtos;
pub mod userdtos;
