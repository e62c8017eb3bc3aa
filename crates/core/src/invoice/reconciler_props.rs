//! Property-based tests for InvoiceReconciler.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use guardbook_shared::types::{ClientId, InvoiceId};

use crate::invoice::reconciler::{InvoiceReconciler, STATUS_AFTER_FULL_REVERSAL};
use crate::invoice::types::{Invoice, InvoiceStatus};

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn open_invoice(amount: Decimal) -> Invoice {
    Invoice {
        id: InvoiceId::new(),
        invoice_number: "INV-PROP".to_string(),
        client_id: ClientId::new(),
        amount,
        paid_amount: Decimal::ZERO,
        status: InvoiceStatus::Pending,
        updated_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Paid amount is always the running sum of applied payments, and the
    /// status is PAID exactly when that sum covers the invoice.
    #[test]
    fn prop_paid_amount_tracks_sum_of_payments(
        invoice_amount in arb_amount(),
        payments in prop::collection::vec(arb_amount(), 1..8),
    ) {
        let mut invoice = open_invoice(invoice_amount);
        let mut expected = Decimal::ZERO;

        for payment in &payments {
            invoice = InvoiceReconciler::apply(&invoice, *payment).unwrap().invoice;
            expected += *payment;
            prop_assert_eq!(invoice.paid_amount, expected);
            prop_assert_eq!(invoice.status == InvoiceStatus::Paid, expected >= invoice_amount);
        }
    }

    /// Reversing then re-applying the same contribution leaves the balance unchanged.
    #[test]
    fn prop_reverse_then_apply_round_trips(
        invoice_amount in arb_amount(),
        payments in prop::collection::vec(arb_amount(), 1..5),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut invoice = open_invoice(invoice_amount);
        for payment in &payments {
            invoice = InvoiceReconciler::apply(&invoice, *payment).unwrap().invoice;
        }
        let contribution = payments[pick.index(payments.len())];

        let reversed = InvoiceReconciler::reverse(&invoice, contribution).invoice;
        let restored = InvoiceReconciler::apply(&reversed, contribution).unwrap().invoice;

        prop_assert_eq!(restored.paid_amount, invoice.paid_amount);
        prop_assert_eq!(restored.status, invoice.status);
    }

    /// Reversal never produces a negative balance and never lands on PENDING.
    #[test]
    fn prop_reverse_never_negative_or_pending(
        invoice_amount in arb_amount(),
        paid in arb_amount(),
        reversal in arb_amount(),
    ) {
        let invoice = InvoiceReconciler::apply(&open_invoice(invoice_amount), paid).unwrap().invoice;
        let change = InvoiceReconciler::reverse(&invoice, reversal);

        prop_assert!(change.invoice.paid_amount >= Decimal::ZERO);
        prop_assert_ne!(change.invoice.status, InvoiceStatus::Pending);
        if change.invoice.paid_amount.is_zero() {
            prop_assert_eq!(change.invoice.status, STATUS_AFTER_FULL_REVERSAL);
        }
    }
}
