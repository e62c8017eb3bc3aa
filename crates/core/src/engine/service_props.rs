//! Property-based tests for the ledger engine.
//!
//! After any sequence of create, edit and soft-delete operations, an
//! invoice's paid amount equals the sum of the live money-in entries
//! linked to it.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use guardbook_shared::config::LedgerConfig;
use guardbook_shared::types::{ClientId, InvoiceId, LedgerEntryId, UserId};

use crate::access::{Actor, Role};
use crate::engine::LedgerEngine;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::ledger::{Client, CreateLedgerEntryInput, Direction, FieldUpdate, PaymentMethod};
use crate::store::MemoryStore;

#[derive(Debug, Clone)]
enum Op {
    Create {
        direction: Direction,
        amount: Decimal,
        invoice: usize,
    },
    EditAmount {
        target: usize,
        amount: Decimal,
    },
    Relink {
        target: usize,
        invoice: usize,
    },
    Unlink {
        target: usize,
    },
    Delete {
        target: usize,
    },
}

const INVOICES: usize = 3;

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..5_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (
            prop_oneof![Just(Direction::MoneyIn), Just(Direction::MoneyOut)],
            arb_amount(),
            0..INVOICES
        )
            .prop_map(|(direction, amount, invoice)| Op::Create {
                direction,
                amount,
                invoice
            }),
        2 => (any::<usize>(), arb_amount()).prop_map(|(target, amount)| Op::EditAmount { target, amount }),
        1 => (any::<usize>(), 0..INVOICES).prop_map(|(target, invoice)| Op::Relink { target, invoice }),
        1 => any::<usize>().prop_map(|target| Op::Unlink { target }),
        1 => any::<usize>().prop_map(|target| Op::Delete { target }),
    ]
}

fn run(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    runtime.block_on(async move {
        let store = MemoryStore::new();
        let client = ClientId::new();
        store.insert_client(Client {
            id: client,
            name: "Prop Client".to_string(),
        });
        let invoices: Vec<InvoiceId> = (0..INVOICES)
            .map(|i| {
                let id = InvoiceId::new();
                store.insert_invoice(Invoice {
                    id,
                    invoice_number: format!("INV-{i}"),
                    client_id: client,
                    amount: Decimal::new(10_000_000, 2),
                    paid_amount: Decimal::ZERO,
                    status: InvoiceStatus::Sent,
                    updated_at: Utc::now(),
                });
                id
            })
            .collect();
        let engine = LedgerEngine::new(store, LedgerConfig::default());
        let owner = Actor::new(UserId::new(), Role::SuperAdmin);
        let mut created: Vec<LedgerEntryId> = Vec::new();

        for op in ops {
            // Individual operations may legitimately fail (no-op edits, archived
            // targets); the invariant must hold either way.
            let _ = match op {
                Op::Create { direction, amount, invoice } => engine
                    .create(
                        CreateLedgerEntryInput {
                            direction: Some(direction),
                            amount,
                            transaction_date: NaiveDate::from_ymd_opt(2026, 7, 1),
                            payment_method: Some(PaymentMethod::Other),
                            source: None,
                            invoice_id: Some(invoices[invoice]),
                            attachments: vec!["doc.pdf".to_string()],
                            ..CreateLedgerEntryInput::default()
                        },
                        &owner,
                    )
                    .await
                    .map(|view| created.push(view.entry.id)),
                Op::EditAmount { target, amount } if !created.is_empty() => engine
                    .edit(created[target % created.len()], vec![FieldUpdate::Amount(amount)], &owner, "amount")
                    .await
                    .map(drop),
                Op::Relink { target, invoice } if !created.is_empty() => engine
                    .edit(
                        created[target % created.len()],
                        vec![FieldUpdate::Invoice(Some(invoices[invoice]))],
                        &owner,
                        "relink",
                    )
                    .await
                    .map(drop),
                Op::Unlink { target } if !created.is_empty() => engine
                    .edit(created[target % created.len()], vec![FieldUpdate::Invoice(None)], &owner, "unlink")
                    .await
                    .map(drop),
                Op::Delete { target } if !created.is_empty() => engine
                    .soft_delete(created[target % created.len()], &owner, "archive")
                    .await
                    .map(drop),
                _ => Ok(()),
            };

            let entries = engine.store().all_entries();
            for invoice_id in &invoices {
                let expected: Decimal = entries
                    .iter()
                    .filter_map(|e| e.invoice_contribution())
                    .filter(|(id, _)| id == invoice_id)
                    .map(|(_, amount)| amount)
                    .sum();
                let invoice = engine
                    .store()
                    .invoice(*invoice_id)
                    .ok_or_else(|| TestCaseError::fail("invoice vanished"))?;
                prop_assert_eq!(invoice.paid_amount, expected);
                prop_assert_eq!(invoice.status == InvoiceStatus::Paid, expected >= invoice.amount);
            }
        }
        Ok::<(), TestCaseError>(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invoice_paid_amount_matches_live_entries(ops in prop::collection::vec(arb_op(), 1..25)) {
        run(ops)?;
    }
}
