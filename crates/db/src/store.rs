//! PostgreSQL-backed ledger store.
//!
//! A unit of work is one database transaction. Entries and invoices read
//! through it are locked with `SELECT ... FOR UPDATE` until commit or
//! rollback, so concurrent reconciliations against one invoice serialize.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::debug;

use guardbook_core::audit::{AuditFilter, AuditLogRecord};
use guardbook_core::invoice::Invoice;
use guardbook_core::ledger::{Client, EntryFilter, LedgerEntry};
use guardbook_core::store::{LedgerStore, StoreError, UnitOfWork};
use guardbook_shared::types::{ClientId, InvoiceId, LedgerEntryId, PageRequest, UserId};

use crate::convert::{
    audit_from_model, audit_to_active, client_from_model, entry_from_model, entry_to_active,
    invoice_balance_update, invoice_from_model,
};
use crate::entities::{audit_logs, clients, invoices, ledger_entries, sea_orm_active_enums as db, users};

fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Ledger store over a SeaORM connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a store over an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Structured filter columns. Source and free-text search are left to
/// `EntryFilter::matches` on the caller's side.
fn entry_condition(filter: &EntryFilter, include_deleted: bool) -> Condition {
    let mut condition = Condition::all();
    if !include_deleted {
        condition = condition.add(ledger_entries::Column::DeletedAt.is_null());
    }
    if let Some(from) = filter.date_from {
        condition = condition.add(ledger_entries::Column::TransactionDate.gte(from));
    }
    if let Some(to) = filter.date_to {
        condition = condition.add(ledger_entries::Column::TransactionDate.lte(to));
    }
    if let Some(method) = filter.payment_method {
        let method: db::PaymentMethod = method.into();
        condition = condition.add(ledger_entries::Column::PaymentMethod.eq(method));
    }
    if let Some(direction) = filter.direction {
        let direction: db::EntryDirection = direction.into();
        condition = condition.add(ledger_entries::Column::Direction.eq(direction));
    }
    if let Some(client) = filter.client_id {
        condition = condition.add(ledger_entries::Column::ClientId.eq(client.into_inner()));
    }
    if let Some(min) = filter.min_amount {
        condition = condition.add(ledger_entries::Column::Amount.gte(min));
    }
    if let Some(max) = filter.max_amount {
        condition = condition.add(ledger_entries::Column::Amount.lte(max));
    }
    condition
}

fn audit_condition(filter: &AuditFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(actor) = filter.actor_id {
        condition = condition.add(audit_logs::Column::ActorId.eq(actor.into_inner()));
    }
    if let Some(action) = filter.action {
        condition = condition.add(audit_logs::Column::Action.eq(action.as_str()));
    }
    if let Some(entity_type) = filter.entity_type {
        condition = condition.add(audit_logs::Column::EntityType.eq(entity_type.as_str()));
    }
    if let Some(entity_id) = filter.entity_id {
        condition = condition.add(audit_logs::Column::EntityId.eq(entity_id));
    }
    if let Some(from) = filter.from {
        condition = condition.add(audit_logs::Column::CreatedAt.gte(from.fixed_offset()));
    }
    if let Some(to) = filter.to {
        condition = condition.add(audit_logs::Column::CreatedAt.lt(to.fixed_offset()));
    }
    condition
}

async fn load_entry<C: ConnectionTrait>(
    db: &C,
    id: LedgerEntryId,
    lock: bool,
) -> Result<Option<LedgerEntry>, StoreError> {
    let mut query = ledger_entries::Entity::find_by_id(id.into_inner());
    if lock {
        query = query.lock_exclusive();
    }
    query
        .one(db)
        .await
        .map_err(backend)?
        .map(entry_from_model)
        .transpose()
}

async fn load_invoice<C: ConnectionTrait>(
    db: &C,
    id: InvoiceId,
    lock: bool,
) -> Result<Option<Invoice>, StoreError> {
    let mut query = invoices::Entity::find_by_id(id.into_inner());
    if lock {
        query = query.lock_exclusive();
    }
    Ok(query.one(db).await.map_err(backend)?.map(invoice_from_model))
}

async fn load_client<C: ConnectionTrait>(db: &C, id: ClientId) -> Result<Option<Client>, StoreError> {
    Ok(clients::Entity::find_by_id(id.into_inner())
        .one(db)
        .await
        .map_err(backend)?
        .map(client_from_model))
}

async fn load_user_name<C: ConnectionTrait>(db: &C, id: UserId) -> Result<Option<String>, StoreError> {
    Ok(users::Entity::find_by_id(id.into_inner())
        .one(db)
        .await
        .map_err(backend)?
        .map(|user| user.full_name))
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type UnitOfWork = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, StoreError> {
        let txn = self.db.begin().await.map_err(backend)?;
        Ok(PgUnitOfWork { txn })
    }

    async fn find_entry(&self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, StoreError> {
        load_entry(&self.db, id, false).await
    }

    async fn list_entries(
        &self,
        filter: &EntryFilter,
        include_deleted: bool,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = ledger_entries::Entity::find()
            .filter(entry_condition(filter, include_deleted))
            .order_by_desc(ledger_entries::Column::TransactionDate)
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(backend)?;
        debug!(rows = rows.len(), include_deleted, "loaded ledger entries");
        rows.into_iter().map(entry_from_model).collect()
    }

    async fn entries_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::DeletedAt.is_null())
            .filter(ledger_entries::Column::TransactionDate.between(from, to))
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(entry_from_model)
            .collect()
    }

    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        load_invoice(&self.db, id, false).await
    }

    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        load_client(&self.db, id).await
    }

    async fn client_names(&self, ids: &[ClientId]) -> Result<HashMap<ClientId, String>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = clients::Entity::find()
            .filter(clients::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows
            .into_iter()
            .map(|row| (ClientId::from_uuid(row.id), row.name))
            .collect())
    }

    async fn find_user_name(&self, id: UserId) -> Result<Option<String>, StoreError> {
        load_user_name(&self.db, id).await
    }

    async fn list_audit_logs(
        &self,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> Result<(Vec<AuditLogRecord>, u64), StoreError> {
        let query = audit_logs::Entity::find().filter(audit_condition(filter));
        let total = query.clone().count(&self.db).await.map_err(backend)?;

        let records = query
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(audit_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, total))
    }
}

/// One database transaction.
#[derive(Debug)]
pub struct PgUnitOfWork {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_entry(&mut self, id: LedgerEntryId) -> Result<Option<LedgerEntry>, StoreError> {
        load_entry(&self.txn, id, true).await
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        entry_to_active(entry)?.insert(&self.txn).await.map_err(backend)?;
        Ok(())
    }

    async fn update_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        ledger_entries::Entity::update(entry_to_active(entry)?)
            .exec(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn lock_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        load_invoice(&self.txn, id, true).await
    }

    async fn save_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        invoice_balance_update(invoice)
            .update(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_client(&mut self, id: ClientId) -> Result<Option<Client>, StoreError> {
        load_client(&self.txn, id).await
    }

    async fn find_user_name(&mut self, id: UserId) -> Result<Option<String>, StoreError> {
        load_user_name(&self.txn, id).await
    }

    async fn append_audit(&mut self, record: &AuditLogRecord) -> Result<(), StoreError> {
        audit_logs::Entity::insert(audit_to_active(record))
            .exec_without_returning(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(backend)
    }

    async fn abort(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(backend)
    }
}
