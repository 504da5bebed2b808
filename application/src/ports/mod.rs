//! Ports (interfaces) for the application layer
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement. Use cases depend only on these traits, never on adapters.

pub mod audit_logger;
pub mod audit_store;
pub mod coordination_checkpoint;
pub mod department_data;
pub mod human_approval;
pub mod progress;
pub mod reasoning_oracle;
