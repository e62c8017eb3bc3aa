//! Core business logic for Guardbook.
//!
//! This crate contains the ledger and reconciliation engine with ZERO web or
//! database dependencies. Persistence is reached through the traits in `store`.
//!
//! # Modules
//!
//! - `access` - Roles, capabilities and the capability check
//! - `ledger` - Ledger entries, validation, tracked fields and listings
//! - `invoice` - Invoice balance reconciliation
//! - `audit` - Append-only audit records
//! - `reconciliation` - Daily and monthly reports
//! - `store` - Store and unit-of-work traits plus an in-memory store
//! - `engine` - The operations callers invoke

pub mod access;
pub mod audit;
pub mod engine;
pub mod invoice;
pub mod ledger;
pub mod reconciliation;
pub mod store;

pub use access::{Actor, Capability, Role};
pub use engine::LedgerEngine;
pub use ledger::LedgerError;
pub use store::{LedgerStore, MemoryStore, StoreError, UnitOfWork};
