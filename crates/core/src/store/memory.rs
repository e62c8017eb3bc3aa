//! In-process store for tests and local tooling.
//!
//! Writers are serialized by a single lock held for the life of a unit of
//! work. Each unit of work reads and edits a private copy of the state; on
//! commit only the entries and invoices it wrote and the audit records it
//! appended are merged into the committed state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};

use guardbook_shared::types::{ClientId, InvoiceId, LedgerEntryId, PageRequest, UserId};

use super::{LedgerStore, StoreError, UnitOfWork};
use crate::audit::{AuditFilter, AuditLogRecord};
use crate::invoice::Invoice;
use crate::ledger::query::EntryFilter;
use crate::ledger::types::{Client, LedgerEntry};

#[derive(Debug, Clone, Default)]
struct State {
    entries: HashMap<LedgerEntryId, LedgerEntry>,
    invoices: HashMap<InvoiceId, Invoice>,
    clients: HashMap<ClientId, Client>,
    users: HashMap<UserId, String>,
    audit: Vec<AuditLogRecord>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

/// Ledger store backed by process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T, StoreError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(f(&state))
    }

    fn seed(&self, f: impl FnOnce(&mut State)) {
        if let Ok(mut state) = self.state.write() {
            f(&mut state);
        }
    }

    // Seeding bypasses the writer lock. A unit of work open at the time
    // does not see the new row, but its commit leaves the row in place.

    /// Registers a client.
    pub fn insert_client(&self, client: Client) {
        self.seed(|s| {
            s.clients.insert(client.id, client);
        });
    }

    /// Registers an invoice.
    pub fn insert_invoice(&self, invoice: Invoice) {
        self.seed(|s| {
            s.invoices.insert(invoice.id, invoice);
        });
    }

    /// Registers a staff user's display name.
    pub fn insert_user(&self, id: UserId, name: impl Into<String>) {
        let name = name.into();
        self.seed(|s| {
            s.users.insert(id, name);
        });
    }

    /// Committed state of one invoice.
    #[must_use]
    pub fn invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.read(|s| s.invoices.get(&id).cloned()).ok().flatten()
    }

    /// Every committed audit record, oldest first.
    #[must_use]
    pub fn audit_records(&self) -> Vec<AuditLogRecord> {
        self.read(|s| s.audit.clone()).unwrap_or_default()
    }

    /// Every committed entry, archived ones included.
    #[must_use]
    pub fn all_entries(&self) -> Vec<LedgerEntry> {
        self.read(|s| s.entries.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, StoreError> {
        let guard = Arc::clone(&self.writer).lock_owned().await;
        let working = self.read(Clone::clone)?;
        Ok(MemoryUnitOfWork {
            committed: Arc::clone(&self.state),
            audit_base: working.audit.len(),
            working,
            written_entries: HashSet::new(),
            written_invoices: HashSet::new(),
            _guard: guard,
        })
    }

    async fn find_entry(&self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, StoreError> {
        self.read(|s| s.entries.get(&id).cloned())
    }

    async fn list_entries(
        &self,
        filter: &EntryFilter,
        include_deleted: bool,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.read(|s| {
            s.entries
                .values()
                .filter(|e| include_deleted || !e.is_deleted())
                .filter(|e| filter.matches(e))
                .cloned()
                .collect()
        })
    }

    async fn entries_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.read(|s| {
            s.entries
                .values()
                .filter(|e| !e.is_deleted() && e.transaction_date >= from && e.transaction_date <= to)
                .cloned()
                .collect()
        })
    }

    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        self.read(|s| s.invoices.get(&id).cloned())
    }

    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        self.read(|s| s.clients.get(&id).cloned())
    }

    async fn client_names(&self, ids: &[ClientId]) -> Result<HashMap<ClientId, String>, StoreError> {
        self.read(|s| {
            ids.iter()
                .filter_map(|id| s.clients.get(id).map(|c| (*id, c.name.clone())))
                .collect()
        })
    }

    async fn find_user_name(&self, id: UserId) -> Result<Option<String>, StoreError> {
        self.read(|s| s.users.get(&id).cloned())
    }

    async fn list_audit_logs(
        &self,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> Result<(Vec<AuditLogRecord>, u64), StoreError> {
        self.read(|s| {
            let matching: Vec<&AuditLogRecord> =
                s.audit.iter().rev().filter(|r| filter.matches(r)).collect();
            let total = matching.len() as u64;
            let records = page.slice(matching).into_iter().cloned().collect();
            (records, total)
        })
    }
}

/// Unit of work over a private copy of the memory store's state.
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    committed: Arc<RwLock<State>>,
    working: State,
    written_entries: HashSet<LedgerEntryId>,
    written_invoices: HashSet<InvoiceId>,
    audit_base: usize,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_entry(&mut self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, StoreError> {
        Ok(self.working.entries.get(&id).cloned())
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        if self.working.entries.contains_key(&entry.id) {
            return Err(StoreError::Backend(format!("duplicate ledger entry {}", entry.id)));
        }
        self.working.entries.insert(entry.id, entry.clone());
        self.written_entries.insert(entry.id);
        Ok(())
    }

    async fn update_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        match self.working.entries.get_mut(&entry.id) {
            Some(slot) => {
                *slot = entry.clone();
                self.written_entries.insert(entry.id);
                Ok(())
            }
            None => Err(StoreError::Backend(format!("ledger entry {} vanished", entry.id))),
        }
    }

    async fn lock_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        Ok(self.working.invoices.get(&id).cloned())
    }

    async fn save_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        self.working.invoices.insert(invoice.id, invoice.clone());
        self.written_invoices.insert(invoice.id);
        Ok(())
    }

    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.working.clients.get(&id).cloned())
    }

    async fn find_user_name(&mut self, id: UserId) -> Result<Option<String>, StoreError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn append_audit(&mut self, record: &AuditLogRecord) -> Result<(), StoreError> {
        self.working.audit.push(record.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let Self {
            committed,
            mut working,
            written_entries,
            written_invoices,
            audit_base,
            _guard,
        } = self;
        let mut state = committed.write().map_err(poisoned)?;
        for id in written_entries {
            if let Some(entry) = working.entries.remove(&id) {
                state.entries.insert(id, entry);
            }
        }
        for id in written_invoices {
            if let Some(invoice) = working.invoices.remove(&id) {
                state.invoices.insert(id, invoice);
            }
        }
        state.audit.extend(working.audit.drain(audit_base..));
        Ok(())
    }

    async fn abort(self) -> Result<(), StoreError> {
        Ok(())
    }
}
