//! Persistence seams for the ledger engine.
//!
//! `LedgerStore` serves committed reads and opens units of work. A
//! `UnitOfWork` carries every write of one logical operation and ends in
//! exactly one of `commit` or `abort`.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use guardbook_shared::types::{ClientId, InvoiceId, LedgerEntryId, PageRequest, UserId};

use crate::audit::{AuditFilter, AuditLogRecord};
use crate::invoice::Invoice;
use crate::ledger::query::EntryFilter;
use crate::ledger::types::{Client, LedgerEntry};

pub use memory::MemoryStore;

/// Persistence failure surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Committed-state reads plus the entry point for writes.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Unit of work type produced by `begin`.
    type UnitOfWork: UnitOfWork;

    /// Opens a unit of work.
    async fn begin(&self) -> Result<Self::UnitOfWork, StoreError>;

    /// Reads one entry, archived or not.
    async fn find_entry(&self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, StoreError>;

    /// Lists entries matching the structured parts of `filter`.
    ///
    /// Implementations may skip the free-text search; the engine re-applies
    /// the whole filter.
    async fn list_entries(
        &self,
        filter: &EntryFilter,
        include_deleted: bool,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Live entries with a transaction date in `[from, to]`.
    async fn entries_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Reads one invoice without locking it.
    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;

    /// Reads one client.
    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError>;

    /// Resolves client names for `ids`; unknown ids are left out.
    async fn client_names(&self, ids: &[ClientId]) -> Result<HashMap<ClientId, String>, StoreError>;

    /// Resolves a staff user's display name.
    async fn find_user_name(&self, id: UserId) -> Result<Option<String>, StoreError>;

    /// Returns one page of audit records matching `filter`, newest first,
    /// and the number of matching records across all pages.
    async fn list_audit_logs(
        &self,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> Result<(Vec<AuditLogRecord>, u64), StoreError>;
}

/// Atomic boundary around one mutating operation.
///
/// Writes are invisible to `LedgerStore` reads until `commit`. Dropping a
/// unit of work without committing discards its writes.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Reads one entry inside the unit of work, locking it for update.
    async fn find_entry(&mut self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, StoreError>;

    /// Persists a new entry.
    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Overwrites an existing entry.
    async fn update_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Reads an invoice and locks it until the unit of work ends.
    async fn lock_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;

    /// Persists an invoice's balance and status.
    async fn save_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError>;

    /// Reads one client.
    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError>;

    /// Resolves a staff user's display name.
    async fn find_user_name(&mut self, id: UserId) -> Result<Option<String>, StoreError>;

    /// Appends one audit record.
    async fn append_audit(&mut self, record: &AuditLogRecord) -> Result<(), StoreError>;

    /// Makes every write visible atomically.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discards every write.
    async fn abort(self) -> Result<(), StoreError>;
}
