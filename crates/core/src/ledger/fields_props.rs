//! Property-based tests for the tracked-field table.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use guardbook_shared::types::{Currency, LedgerEntryId, UserId};

use crate::ledger::fields::{FieldUpdate, apply, diff};
use crate::ledger::types::{Direction, LedgerEntry, PaymentMethod};

fn base_entry() -> LedgerEntry {
    let now = Utc::now();
    LedgerEntry {
        id: LedgerEntryId::new(),
        direction: Direction::MoneyOut,
        amount: Decimal::new(50_000, 2),
        currency: Currency::Ngn,
        transaction_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap_or_default(),
        payment_method: PaymentMethod::Cheque,
        source: Some("fuel".to_string()),
        description: Some("Generator diesel".to_string()),
        client_id: None,
        invoice_id: None,
        receipt_number: None,
        reference_number: None,
        bank_name: None,
        account_name: None,
        notes: None,
        attachments: vec![],
        is_classified: true,
        created_by: UserId::new(),
        created_at: now,
        updated_at: now,
        edit_history: vec![],
        deletion: None,
    }
}

fn arb_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z ]{1,12}")
}

fn arb_update() -> impl Strategy<Value = FieldUpdate> {
    prop_oneof![
        (1i64..100_000i64).prop_map(|n| FieldUpdate::Amount(Decimal::new(n, 2))),
        (1u32..28).prop_map(|d| FieldUpdate::TransactionDate(
            NaiveDate::from_ymd_opt(2026, 1, d).unwrap_or_default()
        )),
        prop::sample::select(PaymentMethod::ALL.to_vec()).prop_map(FieldUpdate::PaymentMethod),
        arb_text().prop_map(FieldUpdate::Description),
        arb_text().prop_map(FieldUpdate::Source),
        arb_text().prop_map(FieldUpdate::Notes),
        arb_text().prop_map(FieldUpdate::BankName),
        prop::collection::vec("[a-z]{1,8}\\.pdf", 0..3).prop_map(FieldUpdate::Attachments),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After applying an edit, diffing the same edit again finds nothing.
    #[test]
    fn prop_apply_then_diff_is_empty(updates in prop::collection::vec(arb_update(), 0..8)) {
        let mut entry = base_entry();
        apply(&mut entry, updates.clone());
        prop_assert!(diff(&entry, &updates).is_empty());
    }

    /// The diff names each field at most once.
    #[test]
    fn prop_diff_fields_are_unique(updates in prop::collection::vec(arb_update(), 0..12)) {
        let entry = base_entry();
        let changes = diff(&entry, &updates);
        let mut names: Vec<_> = changes.iter().map(|c| c.field.clone()).collect();
        names.sort();
        names.dedup();
        prop_assert_eq!(names.len(), changes.len());
    }

    /// Every reported change carries distinct old and new values.
    #[test]
    fn prop_changes_are_real(updates in prop::collection::vec(arb_update(), 0..8)) {
        let entry = base_entry();
        for change in diff(&entry, &updates) {
            prop_assert_ne!(change.old_value, change.new_value);
        }
    }
}
