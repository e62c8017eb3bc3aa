//! Invoice balance reconciliation.
//!
//! Keeps `paid_amount` and `status` in step with the live money-in entries
//! linked to an invoice. Both steps are pure: the caller reads the invoice
//! under a row lock, runs a step, and persists the result in the same unit
//! of work as the entry mutation.

use rust_decimal::Decimal;

use super::types::{BalanceChange, BalanceEvent, Invoice, InvoiceStatus};
use crate::ledger::LedgerError;

/// Status an invoice falls back to once every payment has been reversed.
///
/// An invoice that has been sent never returns to `PENDING`.
pub const STATUS_AFTER_FULL_REVERSAL: InvoiceStatus = InvoiceStatus::Sent;

/// Stateless reconciler for invoice balances.
pub struct InvoiceReconciler;

impl InvoiceReconciler {
    /// Adds `amount` to the invoice's paid amount and re-derives its status.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Conflict` if the invoice is cancelled.
    pub fn apply(invoice: &Invoice, amount: Decimal) -> Result<BalanceChange, LedgerError> {
        if invoice.status == InvoiceStatus::Cancelled {
            return Err(LedgerError::Conflict(format!(
                "Invoice {} is cancelled and cannot accept payments",
                invoice.invoice_number
            )));
        }

        let mut updated = invoice.clone();
        updated.paid_amount += amount;
        updated.status = if updated.paid_amount >= updated.amount {
            InvoiceStatus::Paid
        } else if updated.paid_amount > Decimal::ZERO {
            InvoiceStatus::Sent
        } else {
            invoice.status
        };

        let mut events = Vec::new();
        if updated.paid_amount > updated.amount {
            events.push(BalanceEvent::Overpaid {
                overpayment: updated.paid_amount - updated.amount,
            });
        } else if updated.paid_amount < updated.amount && updated.status != InvoiceStatus::Paid {
            events.push(BalanceEvent::PartialPayment {
                outstanding: updated.amount - updated.paid_amount,
            });
        }

        Ok(BalanceChange {
            previous_status: invoice.status,
            previous_paid: invoice.paid_amount,
            invoice: updated,
            events,
        })
    }

    /// Takes `amount` back off the invoice's paid amount, flooring at zero.
    ///
    /// A cancelled invoice keeps its status.
    #[must_use]
    pub fn reverse(invoice: &Invoice, amount: Decimal) -> BalanceChange {
        let mut updated = invoice.clone();
        updated.paid_amount = (updated.paid_amount - amount).max(Decimal::ZERO);
        updated.status = if invoice.status == InvoiceStatus::Cancelled {
            InvoiceStatus::Cancelled
        } else if updated.paid_amount >= updated.amount {
            InvoiceStatus::Paid
        } else if updated.paid_amount > Decimal::ZERO {
            InvoiceStatus::Sent
        } else {
            STATUS_AFTER_FULL_REVERSAL
        };

        BalanceChange {
            previous_status: invoice.status,
            previous_paid: invoice.paid_amount,
            invoice: updated,
            events: vec![BalanceEvent::PaymentReversed { amount }],
        }
    }
}
