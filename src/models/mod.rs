pub mod collaborator;
pub mod selection;
pub mod session;
pub mod time_window;
