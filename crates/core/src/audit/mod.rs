//! Append-only audit log.
//!
//! The public contract is append and list. No layer exposes update or delete.

pub mod types;

pub use types::{AuditAction, AuditFilter, AuditLogRecord, EntityType};

/// Note attached to the audit record of an archived entry.
pub const ARCHIVED_NOTE: &str = "record archived - audit-only visibility";
