//! The ledger engine.
//!
//! Every mutating operation runs in one unit of work: capability check and
//! input validation first, then the entry write, any invoice balance change
//! and the audit records, then commit. Any error aborts the whole unit.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, error, info, warn};

use guardbook_shared::config::LedgerConfig;
use guardbook_shared::types::{ClientId, InvoiceId, LedgerEntryId, PageRequest, PageResponse};

use crate::access::{Actor, Capability, require_capability};
use crate::audit::{ARCHIVED_NOTE, AuditAction, AuditFilter, AuditLogRecord, EntityType};
use crate::invoice::{BalanceChange, BalanceEvent, Invoice, InvoiceReconciler};
use crate::ledger::fields::{self, FieldUpdate};
use crate::ledger::query::{self, EntryFilter, QueryResult};
use crate::ledger::types::clean_text;
use crate::ledger::validation::{validate_entry, validate_new, validate_reason};
use crate::ledger::{
    CreateLedgerEntryInput, EditHistoryRecord, LedgerEntry, LedgerEntryView, LedgerError,
    Tombstone,
};
use crate::reconciliation::{DailyReport, MonthPeriod, MonthlyReport, ReconciliationService};
use crate::store::{LedgerStore, UnitOfWork};

/// Entry point for every ledger operation.
pub struct LedgerEngine<S> {
    store: S,
    config: LedgerConfig,
}

impl<S: LedgerStore> LedgerEngine<S> {
    /// Creates an engine over `store`.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ledger policy in effect.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Today's date in the business timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.config.timezone).date_naive()
    }

    /// Records a new money-in or money-out entry.
    ///
    /// A money-in entry linked to an invoice pays it down in the same unit of work.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor cannot record entries
    /// - `Validation` for the first failing input rule, starting with a missing direction
    /// - `Conflict` for a missing client or invoice, or a cancelled invoice
    pub async fn create(
        &self,
        input: CreateLedgerEntryInput,
        actor: &Actor,
    ) -> Result<LedgerEntryView, LedgerError> {
        require_capability(actor, Capability::RecordLedgerEntry)?;
        let resolved = validate_new(&input)?;

        let now = Utc::now();
        let mut entry = LedgerEntry {
            id: LedgerEntryId::new(),
            direction: resolved.direction,
            amount: input.amount,
            currency: self.config.currency,
            transaction_date: resolved.transaction_date,
            payment_method: resolved.payment_method,
            source: clean_text(input.source),
            description: clean_text(input.description),
            client_id: input.client_id,
            invoice_id: input.invoice_id,
            receipt_number: clean_text(input.receipt_number),
            reference_number: clean_text(input.reference_number),
            bank_name: clean_text(input.bank_name),
            account_name: clean_text(input.account_name),
            notes: clean_text(input.notes),
            attachments: input.attachments,
            is_classified: false,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
            edit_history: Vec::new(),
            deletion: None,
        };
        entry.refresh_classification();

        let mut uow = self.store.begin().await?;
        let outcome = create_in(&mut uow, entry, actor).await;
        let view = finish(uow, outcome, "create").await?;

        info!(
            entry_id = %view.entry.id,
            actor_id = %actor.id,
            direction = %view.entry.direction,
            amount = %view.entry.amount,
            action = %AuditAction::LedgerEntryCreated,
            "Ledger entry created"
        );
        Ok(view)
    }

    /// Edits tracked fields of a live entry and appends one history record.
    ///
    /// If the invoice contribution changes, the old one is reversed and the
    /// new one applied in the same unit of work.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor cannot edit entries
    /// - `Validation` for a blank reason or an edited entry that breaks a rule
    /// - `NotFound` if the entry is missing or archived
    /// - `NoOp` if nothing would change
    /// - `Conflict` for a missing client or invoice, or a cancelled invoice
    pub async fn edit(
        &self,
        id: LedgerEntryId,
        updates: Vec<FieldUpdate>,
        actor: &Actor,
        reason: &str,
    ) -> Result<LedgerEntryView, LedgerError> {
        require_capability(actor, Capability::EditLedgerEntry)?;
        let reason = validate_reason(reason)?;

        let mut uow = self.store.begin().await?;
        let outcome = edit_in(&mut uow, id, updates, actor, reason).await;
        let view = finish(uow, outcome, "edit").await?;

        info!(
            entry_id = %id,
            actor_id = %actor.id,
            action = %AuditAction::LedgerEntryEdited,
            "Ledger entry edited"
        );
        Ok(view)
    }

    /// Archives a live entry.
    ///
    /// Any invoice contribution is reversed before the tombstone is set.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor cannot delete entries
    /// - `Validation` for a blank reason
    /// - `NotFound` if the entry is missing or already archived
    pub async fn soft_delete(
        &self,
        id: LedgerEntryId,
        actor: &Actor,
        reason: &str,
    ) -> Result<LedgerEntryView, LedgerError> {
        require_capability(actor, Capability::DeleteLedgerEntry)?;
        let reason = validate_reason(reason)?;

        let mut uow = self.store.begin().await?;
        let outcome = soft_delete_in(&mut uow, id, actor, reason).await;
        let view = finish(uow, outcome, "soft_delete").await?;

        info!(
            entry_id = %id,
            actor_id = %actor.id,
            action = %AuditAction::LedgerEntryDeleted,
            "Ledger entry archived"
        );
        Ok(view)
    }

    /// Reads one entry with its references resolved.
    ///
    /// Archived entries are only visible to actors who can view archives.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor cannot view the ledger
    /// - `NotFound` if the entry is missing or hidden
    pub async fn get(&self, id: LedgerEntryId, actor: &Actor) -> Result<LedgerEntryView, LedgerError> {
        require_capability(actor, Capability::ViewLedger)?;

        let entry = self
            .store
            .find_entry(id)
            .await?
            .filter(|e| !e.is_deleted() || actor.can(Capability::ViewArchived))
            .ok_or_else(|| LedgerError::entry_not_found(id))?;

        let client_name = match entry.client_id {
            Some(client_id) => self.store.find_client(client_id).await?.map(|c| c.name),
            None => None,
        };
        let invoice = match entry.invoice_id {
            Some(invoice_id) => self.store.find_invoice(invoice_id).await?.map(|i| i.summary()),
            None => None,
        };
        let actor_name = self.store.find_user_name(entry.created_by).await?;

        Ok(LedgerEntryView {
            entry,
            client_name,
            invoice,
            actor_name,
        })
    }

    /// Lists entries newest first with a summary of the whole filtered set.
    ///
    /// `include_deleted` is ignored unless the actor can view archives.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor cannot view the ledger
    pub async fn query(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
        include_deleted: bool,
        actor: &Actor,
    ) -> Result<QueryResult, LedgerError> {
        require_capability(actor, Capability::ViewLedger)?;
        let include_deleted = include_deleted && actor.can(Capability::ViewArchived);

        let entries: Vec<LedgerEntry> = self
            .store
            .list_entries(filter, include_deleted)
            .await?
            .into_iter()
            .filter(|e| (include_deleted || !e.is_deleted()) && filter.matches(e))
            .collect();

        debug!(
            actor_id = %actor.id,
            matched = entries.len(),
            include_deleted,
            "Ledger query"
        );
        Ok(query::paginate(entries, page))
    }

    /// Reconciles the money-in of one business day.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor cannot view reconciliation
    pub async fn daily_reconciliation(
        &self,
        date: NaiveDate,
        actor: &Actor,
    ) -> Result<DailyReport, LedgerError> {
        require_capability(actor, Capability::ViewReconciliation)?;

        let entries = self.store.entries_between(date, date).await?;
        let report = ReconciliationService::daily(date, &entries, self.today());

        debug!(%date, records = report.record_count, is_closed = report.is_closed, "Daily reconciliation");
        Ok(report)
    }

    /// Reconciles a month against the month before it.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor cannot view reconciliation
    /// - `Validation` for a month outside 1-12
    pub async fn monthly_reconciliation(
        &self,
        month: u32,
        year: i32,
        actor: &Actor,
    ) -> Result<MonthlyReport, LedgerError> {
        require_capability(actor, Capability::ViewReconciliation)?;
        let period = MonthPeriod::new(month, year)?;

        let entries = self
            .store
            .entries_between(period.previous_start, period.end)
            .await?;
        let client_ids: Vec<ClientId> = entries
            .iter()
            .filter_map(|e| e.client_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let client_names = self.store.client_names(&client_ids).await?;

        debug!(month, year, entries = entries.len(), "Monthly reconciliation");
        Ok(ReconciliationService::monthly(
            &period,
            &entries,
            &client_names,
            &self.config.salary_category,
        ))
    }

    /// Lists audit records newest first.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor cannot view the audit log
    pub async fn audit_logs(
        &self,
        filter: &AuditFilter,
        page: PageRequest,
        actor: &Actor,
    ) -> Result<PageResponse<AuditLogRecord>, LedgerError> {
        require_capability(actor, Capability::ViewAuditLog)?;

        let (records, total) = self.store.list_audit_logs(filter, page).await?;
        debug!(actor_id = %actor.id, total, page = page.page, "Audit log listing");
        Ok(PageResponse::new(records, page, total))
    }
}

/// Commits on success, aborts on failure.
async fn finish<U: UnitOfWork, T>(
    uow: U,
    outcome: Result<T, LedgerError>,
    operation: &'static str,
) -> Result<T, LedgerError> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(operation, error = %err, "Aborting unit of work");
            if let Err(abort_err) = uow.abort().await {
                error!(operation, error = %abort_err, "Abort failed");
            }
            Err(err)
        }
    }
}

async fn create_in<U: UnitOfWork>(
    uow: &mut U,
    entry: LedgerEntry,
    actor: &Actor,
) -> Result<LedgerEntryView, LedgerError> {
    if let Some(client_id) = entry.client_id {
        require_client(uow, client_id).await?;
    }
    match (entry.invoice_contribution(), entry.invoice_id) {
        (Some(contribution), _) => apply_contribution(uow, actor, entry.id, contribution).await?,
        (None, Some(invoice_id)) => {
            lock_existing_invoice(uow, invoice_id).await?;
        }
        (None, None) => {}
    }

    uow.insert_entry(&entry).await?;
    uow.append_audit(&AuditLogRecord::new(
        actor.id,
        AuditAction::LedgerEntryCreated,
        EntityType::LedgerEntry,
        entry.id,
        json!({
            "direction": entry.direction,
            "amount": entry.amount,
            "currency": entry.currency,
            "payment_method": entry.payment_method,
            "transaction_date": entry.transaction_date,
            "source": entry.source,
            "client_id": entry.client_id,
            "invoice_id": entry.invoice_id,
        }),
    ))
    .await?;

    enrich(uow, entry, actor).await
}

async fn edit_in<U: UnitOfWork>(
    uow: &mut U,
    id: LedgerEntryId,
    updates: Vec<FieldUpdate>,
    actor: &Actor,
    reason: &str,
) -> Result<LedgerEntryView, LedgerError> {
    let before = find_live_entry(uow, id).await?;

    let changes = fields::diff(&before, &updates);
    if changes.is_empty() {
        return Err(LedgerError::NoOp);
    }

    let mut entry = before.clone();
    fields::apply(&mut entry, updates);
    validate_entry(&entry)?;

    if entry.client_id != before.client_id {
        if let Some(client_id) = entry.client_id {
            require_client(uow, client_id).await?;
        }
    }
    if entry.invoice_id != before.invoice_id {
        if let Some(invoice_id) = entry.invoice_id {
            lock_existing_invoice(uow, invoice_id).await?;
        }
    }

    let old_contribution = before.invoice_contribution();
    let new_contribution = entry.invoice_contribution();
    if old_contribution != new_contribution {
        if let Some(contribution) = old_contribution {
            reverse_contribution(uow, actor, id, contribution).await?;
        }
        if let Some(contribution) = new_contribution {
            apply_contribution(uow, actor, id, contribution).await?;
        }
    }

    let now = Utc::now();
    entry.updated_at = now;
    entry.edit_history.push(EditHistoryRecord {
        edited_at: now,
        edited_by: actor.id,
        reason: reason.to_string(),
        changes: changes.clone(),
    });

    uow.update_entry(&entry).await?;
    uow.append_audit(&AuditLogRecord::new(
        actor.id,
        AuditAction::LedgerEntryEdited,
        EntityType::LedgerEntry,
        id,
        json!({
            "reason": reason,
            "changes": changes,
        }),
    ))
    .await?;

    enrich(uow, entry, actor).await
}

async fn soft_delete_in<U: UnitOfWork>(
    uow: &mut U,
    id: LedgerEntryId,
    actor: &Actor,
    reason: &str,
) -> Result<LedgerEntryView, LedgerError> {
    let mut entry = find_live_entry(uow, id).await?;

    if let Some(contribution) = entry.invoice_contribution() {
        reverse_contribution(uow, actor, id, contribution).await?;
    }

    let now = Utc::now();
    entry.deletion = Some(Tombstone {
        deleted_at: now,
        deleted_by: actor.id,
        reason: reason.to_string(),
    });
    entry.updated_at = now;

    uow.update_entry(&entry).await?;
    uow.append_audit(&AuditLogRecord::new(
        actor.id,
        AuditAction::LedgerEntryDeleted,
        EntityType::LedgerEntry,
        id,
        json!({
            "reason": reason,
            "visibility": "audit_only",
            "note": ARCHIVED_NOTE,
            "direction": entry.direction,
            "amount": entry.amount,
            "invoice_id": entry.invoice_id,
        }),
    ))
    .await?;

    enrich(uow, entry, actor).await
}

async fn find_live_entry<U: UnitOfWork>(
    uow: &mut U,
    id: LedgerEntryId,
) -> Result<LedgerEntry, LedgerError> {
    uow.find_entry(id)
        .await?
        .filter(|e| !e.is_deleted())
        .ok_or_else(|| LedgerError::entry_not_found(id))
}

async fn require_client<U: UnitOfWork>(uow: &mut U, id: ClientId) -> Result<(), LedgerError> {
    match uow.find_client(id).await? {
        Some(_) => Ok(()),
        None => Err(LedgerError::Conflict(format!("Client {id} does not exist"))),
    }
}

async fn lock_existing_invoice<U: UnitOfWork>(
    uow: &mut U,
    id: InvoiceId,
) -> Result<Invoice, LedgerError> {
    uow.lock_invoice(id)
        .await?
        .ok_or_else(|| LedgerError::Conflict(format!("Invoice {id} does not exist")))
}

async fn apply_contribution<U: UnitOfWork>(
    uow: &mut U,
    actor: &Actor,
    entry_id: LedgerEntryId,
    (invoice_id, amount): (InvoiceId, Decimal),
) -> Result<(), LedgerError> {
    let invoice = lock_existing_invoice(uow, invoice_id).await?;
    let change = InvoiceReconciler::apply(&invoice, amount)?;
    persist_balance_change(uow, actor, entry_id, &change).await
}

async fn reverse_contribution<U: UnitOfWork>(
    uow: &mut U,
    actor: &Actor,
    entry_id: LedgerEntryId,
    (invoice_id, amount): (InvoiceId, Decimal),
) -> Result<(), LedgerError> {
    let invoice = lock_existing_invoice(uow, invoice_id).await?;
    let change = InvoiceReconciler::reverse(&invoice, amount);
    persist_balance_change(uow, actor, entry_id, &change).await
}

async fn persist_balance_change<U: UnitOfWork>(
    uow: &mut U,
    actor: &Actor,
    entry_id: LedgerEntryId,
    change: &BalanceChange,
) -> Result<(), LedgerError> {
    let mut invoice = change.invoice.clone();
    invoice.updated_at = Utc::now();
    uow.save_invoice(&invoice).await?;

    for event in &change.events {
        if let BalanceEvent::Overpaid { overpayment } = event {
            warn!(
                invoice_id = %invoice.id,
                invoice_number = %invoice.invoice_number,
                %overpayment,
                "Invoice overpaid"
            );
        }
    }
    for record in AuditLogRecord::for_balance_change(actor.id, change, entry_id.into()) {
        uow.append_audit(&record).await?;
    }
    Ok(())
}

async fn enrich<U: UnitOfWork>(
    uow: &mut U,
    entry: LedgerEntry,
    actor: &Actor,
) -> Result<LedgerEntryView, LedgerError> {
    let client_name = match entry.client_id {
        Some(id) => uow.find_client(id).await?.map(|c| c.name),
        None => None,
    };
    let invoice = match entry.invoice_id {
        Some(id) => uow.lock_invoice(id).await?.map(|i| i.summary()),
        None => None,
    };
    let actor_name = uow.find_user_name(actor.id).await?;

    Ok(LedgerEntryView {
        entry,
        client_name,
        invoice,
        actor_name,
    })
}
