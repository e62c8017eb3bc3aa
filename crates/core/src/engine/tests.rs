//! Engine tests against the in-memory store.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use guardbook_shared::config::LedgerConfig;
use guardbook_shared::types::{ClientId, InvoiceId, LedgerEntryId, PageRequest, UserId};

use super::LedgerEngine;
use crate::access::{Actor, Capability, Role};
use crate::audit::{ARCHIVED_NOTE, AuditAction, AuditFilter, EntityType};
use crate::invoice::{Invoice, InvoiceStatus};
use crate::ledger::{
    Client, CreateLedgerEntryInput, Direction, EntryFilter, FieldUpdate, LedgerEntryPatch,
    LedgerError, PaymentMethod, ValidationRule,
};
use crate::store::MemoryStore;

struct Fixture {
    engine: LedgerEngine<MemoryStore>,
    client: ClientId,
    invoice: InvoiceId,
}

impl Fixture {
    fn new() -> Self {
        let store = MemoryStore::new();
        let client = ClientId::new();
        store.insert_client(Client {
            id: client,
            name: "Lekki Gardens Estate".to_string(),
        });
        let invoice = InvoiceId::new();
        store.insert_invoice(Invoice {
            id: invoice,
            invoice_number: "INV-2026-001".to_string(),
            client_id: client,
            amount: dec!(100000),
            paid_amount: Decimal::ZERO,
            status: InvoiceStatus::Pending,
            updated_at: Utc::now(),
        });
        Self {
            engine: LedgerEngine::new(store, LedgerConfig::default()),
            client,
            invoice,
        }
    }

    fn store(&self) -> &MemoryStore {
        self.engine.store()
    }

    fn add_invoice(&self, amount: Decimal, status: InvoiceStatus) -> InvoiceId {
        let id = InvoiceId::new();
        self.store().insert_invoice(Invoice {
            id,
            invoice_number: format!("INV-{id}"),
            client_id: self.client,
            amount,
            paid_amount: Decimal::ZERO,
            status,
            updated_at: Utc::now(),
        });
        id
    }

    fn paid(&self, id: InvoiceId) -> (Decimal, InvoiceStatus) {
        let invoice = self.store().invoice(id).unwrap();
        (invoice.paid_amount, invoice.status)
    }

    fn actions(&self) -> Vec<AuditAction> {
        self.store().audit_records().iter().map(|r| r.action).collect()
    }

    fn payment(&self, amount: Decimal) -> CreateLedgerEntryInput {
        CreateLedgerEntryInput {
            direction: Some(Direction::MoneyIn),
            amount,
            transaction_date: NaiveDate::from_ymd_opt(2026, 2, 10),
            payment_method: Some(PaymentMethod::BankTransfer),
            source: Some("invoice".to_string()),
            client_id: Some(self.client),
            invoice_id: Some(self.invoice),
            reference_number: Some("TRF-20260210-01".to_string()),
            attachments: vec!["proofs/trf-01.pdf".to_string()],
            ..CreateLedgerEntryInput::default()
        }
    }

    async fn record(&self, input: CreateLedgerEntryInput) -> LedgerEntryId {
        self.engine.create(input, &actor(Role::Accountant)).await.unwrap().entry.id
    }
}

fn actor(role: Role) -> Actor {
    Actor::new(UserId::new(), role)
}

fn expense(amount: Decimal) -> CreateLedgerEntryInput {
    CreateLedgerEntryInput {
        direction: Some(Direction::MoneyOut),
        amount,
        transaction_date: NaiveDate::from_ymd_opt(2026, 2, 11),
        payment_method: Some(PaymentMethod::Cash),
        source: Some("uniforms".to_string()),
        receipt_number: Some("RCP-77".to_string()),
        description: Some("Reflective vests for night shift".to_string()),
        ..CreateLedgerEntryInput::default()
    }
}

// ============================================================================
// create
// ============================================================================

#[tokio::test]
async fn test_create_returns_enriched_entry() {
    let fx = Fixture::new();
    let accountant = actor(Role::Accountant);
    fx.store().insert_user(accountant.id, "Ada Okafor");

    let view = fx.engine.create(fx.payment(dec!(25000)), &accountant).await.unwrap();

    assert_eq!(view.entry.amount, dec!(25000));
    assert!(view.entry.is_classified);
    assert_eq!(view.entry.created_by, accountant.id);
    assert_eq!(view.client_name.as_deref(), Some("Lekki Gardens Estate"));
    assert_eq!(view.actor_name.as_deref(), Some("Ada Okafor"));
    assert_eq!(view.invoice.unwrap().paid_amount, dec!(25000));
    assert_eq!(
        fx.actions(),
        vec![AuditAction::InvoicePartialPayment, AuditAction::LedgerEntryCreated]
    );
}

#[tokio::test]
async fn test_create_without_source_is_unclassified() {
    let fx = Fixture::new();
    let mut input = expense(dec!(4000));
    input.source = None;

    let view = fx.engine.create(input, &actor(Role::Accountant)).await.unwrap();
    assert!(!view.entry.is_classified);
}

#[tokio::test]
async fn test_money_in_without_evidence_persists_nothing() {
    let fx = Fixture::new();
    let mut input = fx.payment(dec!(25000));
    input.attachments.clear();

    let err = fx.engine.create(input, &actor(Role::Accountant)).await.unwrap_err();

    assert!(matches!(err, LedgerError::Validation(v) if v.rule == ValidationRule::EvidenceRequired));
    assert!(fx.store().all_entries().is_empty());
    assert!(fx.store().audit_records().is_empty());
    assert_eq!(fx.paid(fx.invoice), (dec!(0), InvoiceStatus::Pending));
}

#[tokio::test]
async fn test_payment_without_direction_leaves_invoice_untouched() {
    let fx = Fixture::new();
    let mut input = fx.payment(dec!(40000));
    input.direction = None;

    let err = fx.engine.create(input, &actor(Role::Accountant)).await.unwrap_err();

    assert!(matches!(err, LedgerError::Validation(v) if v.rule == ValidationRule::DirectionRequired));
    assert!(fx.store().all_entries().is_empty());
    assert_eq!(fx.paid(fx.invoice), (dec!(0), InvoiceStatus::Pending));
}

#[tokio::test]
async fn test_create_requires_capability() {
    let fx = Fixture::new();
    let err = fx.engine.create(expense(dec!(10)), &actor(Role::Supervisor)).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Authorization {
            capability: Capability::RecordLedgerEntry,
            ..
        }
    ));
}

#[tokio::test]
async fn test_create_with_unknown_invoice_conflicts() {
    let fx = Fixture::new();
    let mut input = fx.payment(dec!(1000));
    input.invoice_id = Some(InvoiceId::new());

    let err = fx.engine.create(input, &actor(Role::Accountant)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
    assert!(fx.store().all_entries().is_empty());
}

#[tokio::test]
async fn test_create_with_unknown_client_conflicts() {
    let fx = Fixture::new();
    let mut input = fx.payment(dec!(1000));
    input.client_id = Some(ClientId::new());

    let err = fx.engine.create(input, &actor(Role::Accountant)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
}

#[tokio::test]
async fn test_payment_against_cancelled_invoice_conflicts() {
    let fx = Fixture::new();
    let cancelled = fx.add_invoice(dec!(5000), InvoiceStatus::Cancelled);
    let mut input = fx.payment(dec!(1000));
    input.invoice_id = Some(cancelled);

    let err = fx.engine.create(input, &actor(Role::Accountant)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
    assert_eq!(fx.paid(cancelled), (dec!(0), InvoiceStatus::Cancelled));
}

#[tokio::test]
async fn test_money_out_linked_to_invoice_does_not_pay_it() {
    let fx = Fixture::new();
    let mut input = expense(dec!(3000));
    input.invoice_id = Some(fx.invoice);

    fx.engine.create(input, &actor(Role::Accountant)).await.unwrap();
    assert_eq!(fx.paid(fx.invoice), (dec!(0), InvoiceStatus::Pending));
}

#[tokio::test]
async fn test_overpayment_scenario() {
    let fx = Fixture::new();

    fx.record(fx.payment(dec!(60000))).await;
    assert_eq!(fx.paid(fx.invoice), (dec!(60000), InvoiceStatus::Sent));

    fx.record(fx.payment(dec!(50000))).await;
    assert_eq!(fx.paid(fx.invoice), (dec!(110000), InvoiceStatus::Paid));

    let overpaid: Vec<_> = fx
        .store()
        .audit_records()
        .into_iter()
        .filter(|r| r.action == AuditAction::InvoiceOverpaid)
        .collect();
    assert_eq!(overpaid.len(), 1);
    assert_eq!(overpaid[0].entity_type, EntityType::Invoice);
    assert_eq!(overpaid[0].metadata["overpayment"], serde_json::json!(dec!(10000)));
}

// ============================================================================
// edit
// ============================================================================

#[tokio::test]
async fn test_edit_without_changes_is_rejected() {
    let fx = Fixture::new();
    let id = fx.record(expense(dec!(4500))).await;

    let err = fx
        .engine
        .edit(id, vec![FieldUpdate::Amount(dec!(4500.00))], &actor(Role::Manager), "recount")
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::NoOp));
    let entry = fx.store().all_entries().pop().unwrap();
    assert!(entry.edit_history.is_empty());
}

#[tokio::test]
async fn test_edit_appends_one_history_record() {
    let fx = Fixture::new();
    let id = fx.record(expense(dec!(4500))).await;
    let manager = actor(Role::Manager);

    let view = fx
        .engine
        .edit(
            id,
            vec![
                FieldUpdate::Amount(dec!(5000)),
                FieldUpdate::Notes(Some("Price went up".to_string())),
                FieldUpdate::Source(Some("uniforms".to_string())),
            ],
            &manager,
            "Supplier invoice corrected",
        )
        .await
        .unwrap();

    assert_eq!(view.entry.amount, dec!(5000));
    assert_eq!(view.entry.edit_history.len(), 1);
    let record = &view.entry.edit_history[0];
    assert_eq!(record.changes.len(), 2);
    assert_eq!(record.edited_by, manager.id);
    assert_eq!(record.reason, "Supplier invoice corrected");
    assert_eq!(fx.actions().last(), Some(&AuditAction::LedgerEntryEdited));
}

#[tokio::test]
async fn test_create_and_edit_normalize_text_alike() {
    let fx = Fixture::new();
    let mut input = expense(dec!(1200));
    input.source = Some("  uniforms ".to_string());
    input.notes = Some("   ".to_string());
    let view = fx.engine.create(input, &actor(Role::Accountant)).await.unwrap();
    assert_eq!(view.entry.source.as_deref(), Some("uniforms"));
    assert_eq!(view.entry.notes, None);

    let patch: LedgerEntryPatch =
        serde_json::from_value(serde_json::json!({ "source": " uniforms  " })).unwrap();
    let err = fx
        .engine
        .edit(view.entry.id, patch.into_updates(), &actor(Role::Manager), "tidy")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NoOp));
}

#[tokio::test]
async fn test_edit_amount_rebalances_invoice() {
    let fx = Fixture::new();
    let id = fx.record(fx.payment(dec!(60000))).await;

    fx.engine
        .edit(id, vec![FieldUpdate::Amount(dec!(100000))], &actor(Role::Manager), "typo")
        .await
        .unwrap();

    assert_eq!(fx.paid(fx.invoice), (dec!(100000), InvoiceStatus::Paid));
    let actions = fx.actions();
    assert!(actions.contains(&AuditAction::InvoicePaymentReversed));
}

#[tokio::test]
async fn test_edit_moves_payment_between_invoices() {
    let fx = Fixture::new();
    let other = fx.add_invoice(dec!(40000), InvoiceStatus::Sent);
    let id = fx.record(fx.payment(dec!(40000))).await;

    fx.engine
        .edit(id, vec![FieldUpdate::Invoice(Some(other))], &actor(Role::Manager), "wrong invoice")
        .await
        .unwrap();

    assert_eq!(fx.paid(fx.invoice), (dec!(0), InvoiceStatus::Sent));
    assert_eq!(fx.paid(other), (dec!(40000), InvoiceStatus::Paid));
}

#[tokio::test]
async fn test_failed_edit_leaves_everything_untouched() {
    let fx = Fixture::new();
    let cancelled = fx.add_invoice(dec!(60000), InvoiceStatus::Cancelled);
    let id = fx.record(fx.payment(dec!(60000))).await;
    let audit_before = fx.store().audit_records().len();

    // The old invoice is reversed inside the unit of work before the new one refuses payment.
    let err = fx
        .engine
        .edit(
            id,
            vec![FieldUpdate::Invoice(Some(cancelled))],
            &actor(Role::Manager),
            "relink",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Conflict(_)));
    assert_eq!(fx.paid(fx.invoice), (dec!(60000), InvoiceStatus::Sent));
    let entry = fx.store().all_entries().pop().unwrap();
    assert_eq!(entry.invoice_id, Some(fx.invoice));
    assert!(entry.edit_history.is_empty());
    assert_eq!(fx.store().audit_records().len(), audit_before);
}

#[tokio::test]
async fn test_edit_revalidates_entry() {
    let fx = Fixture::new();
    let id = fx.record(fx.payment(dec!(1000))).await;

    let err = fx
        .engine
        .edit(id, vec![FieldUpdate::PaymentMethod(PaymentMethod::Cash)], &actor(Role::Manager), "was cash")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(v) if v.rule == ValidationRule::ReceiptNumberRequired));

    fx.engine
        .edit(
            id,
            vec![
                FieldUpdate::PaymentMethod(PaymentMethod::Cash),
                FieldUpdate::ReceiptNumber(Some("RCP-1001".to_string())),
            ],
            &actor(Role::Manager),
            "was cash",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_edit_guards() {
    let fx = Fixture::new();
    let id = fx.record(expense(dec!(900))).await;
    let updates = || vec![FieldUpdate::Amount(dec!(950))];

    let err = fx.engine.edit(id, updates(), &actor(Role::Accountant), "x").await.unwrap_err();
    assert!(matches!(err, LedgerError::Authorization { .. }));

    let err = fx.engine.edit(id, updates(), &actor(Role::Manager), "   ").await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(v) if v.rule == ValidationRule::ReasonRequired));

    let err = fx
        .engine
        .edit(LedgerEntryId::new(), updates(), &actor(Role::Manager), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

// ============================================================================
// soft delete
// ============================================================================

#[tokio::test]
async fn test_soft_delete_reverses_invoice_and_hides_entry() {
    let fx = Fixture::new();
    let id = fx.record(fx.payment(dec!(60000))).await;
    fx.engine
        .edit(id, vec![FieldUpdate::Notes(Some("ok".to_string()))], &actor(Role::Manager), "note")
        .await
        .unwrap();
    let super_admin = actor(Role::SuperAdmin);

    let view = fx.engine.soft_delete(id, &super_admin, "Entered twice").await.unwrap();

    assert_eq!(view.entry.amount, dec!(60000));
    assert_eq!(view.entry.direction, Direction::MoneyIn);
    assert_eq!(view.entry.edit_history.len(), 1);
    let tombstone = view.entry.deletion.unwrap();
    assert_eq!(tombstone.deleted_by, super_admin.id);
    assert_eq!(tombstone.reason, "Entered twice");
    assert_eq!(fx.paid(fx.invoice), (dec!(0), InvoiceStatus::Sent));

    let deleted = fx
        .store()
        .audit_records()
        .into_iter()
        .find(|r| r.action == AuditAction::LedgerEntryDeleted)
        .unwrap();
    assert_eq!(deleted.metadata["note"], ARCHIVED_NOTE);
    assert_eq!(deleted.metadata["visibility"], "audit_only");

    let page = PageRequest::default();
    let filter = EntryFilter::default();
    let admin_view = fx.engine.query(&filter, page, true, &actor(Role::Admin)).await.unwrap();
    assert!(admin_view.records.is_empty());
    let archive_view = fx.engine.query(&filter, page, true, &super_admin).await.unwrap();
    assert_eq!(archive_view.records.len(), 1);
    let default_view = fx.engine.query(&filter, page, false, &super_admin).await.unwrap();
    assert!(default_view.records.is_empty());

    assert!(matches!(
        fx.engine.get(id, &actor(Role::Manager)).await,
        Err(LedgerError::NotFound { .. })
    ));
    assert!(fx.engine.get(id, &super_admin).await.is_ok());
}

#[tokio::test]
async fn test_soft_delete_guards() {
    let fx = Fixture::new();
    let id = fx.record(expense(dec!(900))).await;

    let err = fx.engine.soft_delete(id, &actor(Role::Admin), "dup").await.unwrap_err();
    assert!(matches!(err, LedgerError::Authorization { .. }));

    let err = fx.engine.soft_delete(id, &actor(Role::SuperAdmin), "").await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    fx.engine.soft_delete(id, &actor(Role::SuperAdmin), "dup").await.unwrap();
    let err = fx.engine.soft_delete(id, &actor(Role::SuperAdmin), "dup").await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));

    let err = fx
        .engine
        .edit(id, vec![FieldUpdate::Amount(dec!(1))], &actor(Role::SuperAdmin), "late fix")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

// ============================================================================
// reads
// ============================================================================

#[tokio::test]
async fn test_query_filters_and_summarizes() {
    let fx = Fixture::new();
    fx.record(fx.payment(dec!(20000))).await;
    fx.record(expense(dec!(3000))).await;
    let mut unclassified = expense(dec!(1500));
    unclassified.source = None;
    unclassified.notes = Some("Generator repair at Ikoyi post".to_string());
    fx.record(unclassified).await;

    let supervisor = actor(Role::Supervisor);
    let outflows = EntryFilter {
        direction: Some(Direction::MoneyOut),
        ..EntryFilter::default()
    };
    let result = fx
        .engine
        .query(&outflows, PageRequest::new(1, 1), false, &supervisor)
        .await
        .unwrap();

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.pagination.total, 2);
    assert_eq!(result.summary.total, dec!(4500));
    assert_eq!(result.summary.by_payment_method.cash, dec!(4500));
    assert_eq!(result.summary.unclassified_count, 1);

    let search = EntryFilter {
        search: Some("IKOYI".to_string()),
        ..EntryFilter::default()
    };
    let result = fx.engine.query(&search, PageRequest::default(), false, &supervisor).await.unwrap();
    assert_eq!(result.records.len(), 1);

    assert!(matches!(
        fx.engine.query(&search, PageRequest::default(), false, &actor(Role::Viewer)).await,
        Err(LedgerError::Authorization { .. })
    ));
}

#[tokio::test]
async fn test_daily_reconciliation_through_engine() {
    let fx = Fixture::new();
    fx.record(fx.payment(dec!(20000))).await;
    let mut cash = fx.payment(dec!(5000));
    cash.payment_method = Some(PaymentMethod::Cash);
    cash.receipt_number = Some("RCP-5".to_string());
    cash.invoice_id = None;
    cash.source = Some("client".to_string());
    fx.record(cash).await;

    let day = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
    let report = fx
        .engine
        .daily_reconciliation(day, &actor(Role::Accountant))
        .await
        .unwrap();

    assert_eq!(report.grand_total, dec!(25000));
    assert_eq!(report.totals.bank_transfer, dec!(20000));
    assert_eq!(report.totals.cash, dec!(5000));
    assert_eq!(report.record_count, 2);
    assert!(report.is_closed);
}

#[tokio::test]
async fn test_monthly_reconciliation_rejects_bad_month() {
    let fx = Fixture::new();
    let err = fx
        .engine
        .monthly_reconciliation(13, 2026, &actor(Role::Accountant))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(v) if v.rule == ValidationRule::InvalidPeriod));

    let report = fx
        .engine
        .monthly_reconciliation(2, 2026, &actor(Role::Accountant))
        .await
        .unwrap();
    assert_eq!(report.current.money_in, dec!(0));
}

#[tokio::test]
async fn test_monthly_reconciliation_names_clients() {
    let fx = Fixture::new();
    fx.record(fx.payment(dec!(20000))).await;

    let report = fx
        .engine
        .monthly_reconciliation(2, 2026, &actor(Role::Accountant))
        .await
        .unwrap();

    assert_eq!(report.current.money_in, dec!(20000));
    assert_eq!(report.clients[0].client_name, "Lekki Gardens Estate");
    assert_eq!(report.clients[0].percentage, dec!(100));
}

#[tokio::test]
async fn test_audit_log_listing() {
    let fx = Fixture::new();
    let id = fx.record(expense(dec!(700))).await;
    fx.engine
        .edit(id, vec![FieldUpdate::Amount(dec!(750))], &actor(Role::Manager), "recount")
        .await
        .unwrap();

    assert!(matches!(
        fx.engine
            .audit_logs(&AuditFilter::default(), PageRequest::default(), &actor(Role::Manager))
            .await,
        Err(LedgerError::Authorization { .. })
    ));

    let filter = AuditFilter {
        entity_id: Some(id.into()),
        ..AuditFilter::default()
    };
    let page = fx
        .engine
        .audit_logs(&filter, PageRequest::default(), &actor(Role::Admin))
        .await
        .unwrap();
    let actions: Vec<_> = page.data.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::LedgerEntryEdited, AuditAction::LedgerEntryCreated]
    );
    assert_eq!(page.meta.total, 2);
}
