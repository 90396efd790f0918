pub mod availability;
pub mod backend_service;
pub mod booking_flow;
pub mod submission;
pub mod time_slot;
