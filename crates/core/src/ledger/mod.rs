//! Money-in / money-out ledger.
//!
//! This module implements the ledger entry model:
//! - Domain types for entries, history and tombstones
//! - Business rule validation
//! - The tracked-field table used for edits and their history
//! - Filtering, ordering and summaries for listings
//! - Error types for ledger operations

pub mod error;
pub mod fields;
pub mod query;
pub mod types;
pub mod validation;

#[cfg(test)]
mod fields_props;

pub use error::{LedgerError, ValidationError, ValidationRule};
pub use fields::{FieldUpdate, LedgerEntryPatch, TrackedField};
pub use query::{EntryFilter, LedgerSummary, MethodTotals, QueryResult};
pub use types::{
    Client, CreateLedgerEntryInput, Direction, EditHistoryRecord, FieldChange, LedgerEntry,
    LedgerEntryView, MoneyInSource, PaymentMethod, Tombstone,
};
