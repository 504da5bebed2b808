//! Human approval adapters for the terminal

pub mod interactive;

pub use interactive::InteractiveHumanApproval;
