//! Structured audit logging.
//!
//! Provides [`JsonlAuditLogger`], an append-only JSONL writer that implements
//! the [`AuditLogger`](civic_application::AuditLogger) port.

mod jsonl_audit;

pub use jsonl_audit::JsonlAuditLogger;
