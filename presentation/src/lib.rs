//! Presentation layer for civic-quorum
//!
//! This crate contains CLI definitions, output formatters,
//! progress reporters, and the terminal approval prompt.

pub mod approval;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use approval::InteractiveHumanApproval;
pub use cli::commands::{ApprovalMode, Cli, Command, CoordinateArgs, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
