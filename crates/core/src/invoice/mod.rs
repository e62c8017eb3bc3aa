//! Invoice balance reconciliation.
//!
//! - `types` - Invoice, status and balance events
//! - `reconciler` - Apply and reverse ledger contributions

pub mod reconciler;
pub mod types;

#[cfg(test)]
mod reconciler_props;

pub use reconciler::{InvoiceReconciler, STATUS_AFTER_FULL_REVERSAL};
pub use types::{BalanceChange, BalanceEvent, Invoice, InvoiceStatus, InvoiceSummary};
