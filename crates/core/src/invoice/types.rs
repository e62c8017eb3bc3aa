//! Invoice types as seen by the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use guardbook_shared::types::{ClientId, InvoiceId};

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Drafted, not yet sent to the client.
    Pending,
    /// Sent to the client; may be partially paid.
    Sent,
    /// Past its due date.
    Overdue,
    /// Fully paid.
    Paid,
    /// Voided; accepts no further payments.
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Overdue => "OVERDUE",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "SENT" => Some(Self::Sent),
            "OVERDUE" => Some(Self::Overdue),
            "PAID" => Some(Self::Paid),
            "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An invoice owed by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice id.
    pub id: InvoiceId,
    /// Human-facing invoice number.
    pub invoice_number: String,
    /// Billed client.
    pub client_id: ClientId,
    /// Amount owed.
    pub amount: Decimal,
    /// Amount paid so far.
    pub paid_amount: Decimal,
    /// Current status.
    pub status: InvoiceStatus,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Amount still owed; zero once paid or overpaid.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        (self.amount - self.paid_amount).max(Decimal::ZERO)
    }

    /// Display summary of this invoice.
    #[must_use]
    pub fn summary(&self) -> InvoiceSummary {
        InvoiceSummary {
            id: self.id,
            invoice_number: self.invoice_number.clone(),
            amount: self.amount,
            paid_amount: self.paid_amount,
            status: self.status,
        }
    }
}

/// Compact invoice view embedded in ledger entry responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    /// Invoice id.
    pub id: InvoiceId,
    /// Human-facing invoice number.
    pub invoice_number: String,
    /// Amount owed.
    pub amount: Decimal,
    /// Amount paid so far.
    pub paid_amount: Decimal,
    /// Current status.
    pub status: InvoiceStatus,
}

/// Notable balance outcome raised while reconciling an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceEvent {
    /// Paid amount now exceeds the invoice amount.
    Overpaid {
        /// Amount paid beyond the invoice amount.
        overpayment: Decimal,
    },
    /// Invoice is still short after a payment.
    PartialPayment {
        /// Amount still owed.
        outstanding: Decimal,
    },
    /// A previous contribution was taken back.
    PaymentReversed {
        /// Amount reversed.
        amount: Decimal,
    },
}

/// An invoice after a reconciler step plus the events it raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    /// Updated invoice, not yet persisted.
    pub invoice: Invoice,
    /// Status before the step.
    pub previous_status: InvoiceStatus,
    /// Paid amount before the step.
    pub previous_paid: Decimal,
    /// Events to record in the audit log.
    pub events: Vec<BalanceEvent>,
}
