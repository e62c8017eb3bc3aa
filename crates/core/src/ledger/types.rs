//! Ledger domain types.
//!
//! A ledger entry is one recorded money movement: cash collected from a client,
//! a transfer paying guards' salaries, a POS payment for uniforms.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use guardbook_shared::types::{ClientId, Currency, InvoiceId, LedgerEntryId, UserId};

use crate::invoice::InvoiceSummary;

/// Direction of a money movement. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Money received.
    MoneyIn,
    /// Money paid out.
    MoneyOut,
}

impl Direction {
    /// Returns the string representation of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MoneyIn => "MONEY_IN",
            Self::MoneyOut => "MONEY_OUT",
        }
    }

    /// Parses a direction from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "MONEY_IN" | "IN" => Some(Self::MoneyIn),
            "MONEY_OUT" | "OUT" => Some(Self::MoneyOut),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; needs a receipt number.
    Cash,
    /// Bank transfer; needs an external reference.
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Mobile money wallet.
    MobileMoney,
    /// Card terminal; needs an external reference.
    Pos,
    /// Anything else.
    Other,
}

impl PaymentMethod {
    /// Every method, in reporting order.
    pub const ALL: [Self; 6] = [
        Self::Cash,
        Self::BankTransfer,
        Self::Cheque,
        Self::MobileMoney,
        Self::Pos,
        Self::Other,
    ];

    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::MobileMoney => "mobile_money",
            Self::Pos => "pos",
            Self::Other => "other",
        }
    }

    /// Parses a method from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "cash" => Some(Self::Cash),
            "bank_transfer" | "transfer" => Some(Self::BankTransfer),
            "cheque" | "check" => Some(Self::Cheque),
            "mobile_money" | "mobile" => Some(Self::MobileMoney),
            "pos" => Some(Self::Pos),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// True if the method needs a receipt number.
    #[must_use]
    pub const fn requires_receipt(self) -> bool {
        matches!(self, Self::Cash)
    }

    /// True if the method needs an external reference number.
    #[must_use]
    pub const fn requires_reference(self) -> bool {
        matches!(self, Self::BankTransfer | Self::Pos)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of sources money can come in from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyInSource {
    /// Payment from a client outside an invoice.
    Client,
    /// Settlement of a client invoice.
    Invoice,
    /// Refund or repayment by a staff member.
    Staff,
    /// Sale of company equipment.
    AssetSale,
    /// Loan proceeds.
    Loan,
    /// Owner capital.
    CapitalInjection,
    /// Anything else.
    Miscellaneous,
}

impl MoneyInSource {
    /// Returns the string representation of the source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Invoice => "invoice",
            Self::Staff => "staff",
            Self::AssetSale => "asset_sale",
            Self::Loan => "loan",
            Self::CapitalInjection => "capital_injection",
            Self::Miscellaneous => "miscellaneous",
        }
    }

    /// Parses a source from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "client" => Some(Self::Client),
            "invoice" => Some(Self::Invoice),
            "staff" => Some(Self::Staff),
            "asset_sale" => Some(Self::AssetSale),
            "loan" => Some(Self::Loan),
            "capital_injection" => Some(Self::CapitalInjection),
            "miscellaneous" => Some(Self::Miscellaneous),
            _ => None,
        }
    }

    /// True for sources that imply a paying client.
    #[must_use]
    pub const fn requires_client(self) -> bool {
        matches!(self, Self::Client | Self::Invoice)
    }
}

/// One field that changed during an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Field name from the tracked-field table.
    pub field: String,
    /// Value before the edit.
    pub old_value: serde_json::Value,
    /// Value after the edit.
    pub new_value: serde_json::Value,
}

/// One edit event appended to an entry's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditHistoryRecord {
    /// When the edit was committed.
    pub edited_at: DateTime<Utc>,
    /// Who made the edit.
    pub edited_by: UserId,
    /// Why the edit was made.
    pub reason: String,
    /// Per-field changes; never empty.
    pub changes: Vec<FieldChange>,
}

/// Tombstone set when an entry is soft-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    /// When the entry was archived.
    pub deleted_at: DateTime<Utc>,
    /// Who archived it.
    pub deleted_by: UserId,
    /// Why it was archived.
    pub reason: String,
}

/// A recorded money-in or money-out event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Immutable identity.
    pub id: LedgerEntryId,
    /// Immutable direction.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: Currency,
    /// Business date supplied by the caller.
    pub transaction_date: NaiveDate,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Category (money-out) or source (money-in).
    pub source: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Linked client.
    pub client_id: Option<ClientId>,
    /// Linked invoice (at most one).
    pub invoice_id: Option<InvoiceId>,
    /// Cash receipt number.
    pub receipt_number: Option<String>,
    /// Bank or POS reference number.
    pub reference_number: Option<String>,
    /// Bank name for transfers.
    pub bank_name: Option<String>,
    /// Account name for transfers.
    pub account_name: Option<String>,
    /// Internal notes.
    pub notes: Option<String>,
    /// Evidence attachment references.
    pub attachments: Vec<String>,
    /// True once a source/category is set.
    pub is_classified: bool,
    /// Who recorded the entry.
    pub created_by: UserId,
    /// System timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// System timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
    /// Append-only edit history.
    pub edit_history: Vec<EditHistoryRecord>,
    /// Set once the entry is archived.
    pub deletion: Option<Tombstone>,
}

impl LedgerEntry {
    /// True once the entry has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deletion.is_some()
    }

    /// The invoice this entry pays down, and by how much.
    ///
    /// Only live money-in entries contribute to an invoice balance.
    #[must_use]
    pub fn invoice_contribution(&self) -> Option<(InvoiceId, Decimal)> {
        match (self.direction, self.invoice_id, self.is_deleted()) {
            (Direction::MoneyIn, Some(invoice_id), false) => Some((invoice_id, self.amount)),
            _ => None,
        }
    }

    /// True if the entry has no evidence attached.
    #[must_use]
    pub fn is_missing_evidence(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Recomputes `is_classified` from `source`.
    pub fn refresh_classification(&mut self) {
        self.is_classified = has_text(self.source.as_deref());
    }
}

/// Trims free text; blank becomes `None`.
pub(crate) fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// True if `value` holds non-blank text.
pub(crate) fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Caller-supplied data for a new entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLedgerEntryInput {
    /// Direction. Required; absent is rejected by validation.
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Amount; must be positive. Absent means zero, which validation rejects.
    #[serde(default)]
    pub amount: Decimal,
    /// Business date.
    pub transaction_date: Option<NaiveDate>,
    /// Payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Category or source.
    #[serde(default)]
    pub source: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Linked client.
    #[serde(default)]
    pub client_id: Option<ClientId>,
    /// Linked invoice.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    /// Receipt number.
    #[serde(default)]
    pub receipt_number: Option<String>,
    /// Reference number.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Bank name.
    #[serde(default)]
    pub bank_name: Option<String>,
    /// Account name.
    #[serde(default)]
    pub account_name: Option<String>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Evidence attachments.
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// A client as far as the ledger cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Client id.
    pub id: ClientId,
    /// Display name.
    pub name: String,
}

/// An entry enriched with resolved references for display.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntryView {
    /// The persisted entry.
    #[serde(flatten)]
    pub entry: LedgerEntry,
    /// Name of the linked client.
    pub client_name: Option<String>,
    /// Linked invoice after this operation.
    pub invoice: Option<InvoiceSummary>,
    /// Name of the acting user.
    pub actor_name: Option<String>,
}
