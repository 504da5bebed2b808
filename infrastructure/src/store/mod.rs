//! Audit store adapters

mod memory;

pub use memory::{AuditSnapshot, InMemoryAuditStore};
