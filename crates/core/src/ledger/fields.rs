//! The tracked-field table for ledger edits.
//!
//! `FieldUpdate` is both the set of editable fields and the set of fields the
//! edit history tracks: `diff` and `apply` dispatch on the same enum, so a
//! field cannot be changed without being recorded.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::fmt;

use guardbook_shared::types::{ClientId, InvoiceId};

use super::types::{FieldChange, LedgerEntry, PaymentMethod, clean_text};

/// A field that may be edited after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackedField {
    /// `amount`
    Amount,
    /// `transaction_date`
    TransactionDate,
    /// `payment_method`
    PaymentMethod,
    /// `description`
    Description,
    /// `source`
    Source,
    /// `client_id`
    Client,
    /// `invoice_id`
    Invoice,
    /// `receipt_number`
    ReceiptNumber,
    /// `reference_number`
    ReferenceNumber,
    /// `bank_name`
    BankName,
    /// `account_name`
    AccountName,
    /// `notes`
    Notes,
    /// `attachments`
    Attachments,
}

impl TrackedField {
    /// Every tracked field, in table order.
    pub const ALL: [Self; 13] = [
        Self::Amount,
        Self::TransactionDate,
        Self::PaymentMethod,
        Self::Description,
        Self::Source,
        Self::Client,
        Self::Invoice,
        Self::ReceiptNumber,
        Self::ReferenceNumber,
        Self::BankName,
        Self::AccountName,
        Self::Notes,
        Self::Attachments,
    ];

    /// Field name as it appears on the entry and in history records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::TransactionDate => "transaction_date",
            Self::PaymentMethod => "payment_method",
            Self::Description => "description",
            Self::Source => "source",
            Self::Client => "client_id",
            Self::Invoice => "invoice_id",
            Self::ReceiptNumber => "receipt_number",
            Self::ReferenceNumber => "reference_number",
            Self::BankName => "bank_name",
            Self::AccountName => "account_name",
            Self::Notes => "notes",
            Self::Attachments => "attachments",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed new value for one tracked field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// New amount.
    Amount(Decimal),
    /// New business date.
    TransactionDate(NaiveDate),
    /// New payment method.
    PaymentMethod(PaymentMethod),
    /// New or cleared description.
    Description(Option<String>),
    /// New or cleared source/category.
    Source(Option<String>),
    /// New or cleared client link.
    Client(Option<ClientId>),
    /// New or cleared invoice link.
    Invoice(Option<InvoiceId>),
    /// New or cleared receipt number.
    ReceiptNumber(Option<String>),
    /// New or cleared reference number.
    ReferenceNumber(Option<String>),
    /// New or cleared bank name.
    BankName(Option<String>),
    /// New or cleared account name.
    AccountName(Option<String>),
    /// New or cleared notes.
    Notes(Option<String>),
    /// Replacement attachment list.
    Attachments(Vec<String>),
}

impl FieldUpdate {
    /// The field this update targets.
    #[must_use]
    pub const fn field(&self) -> TrackedField {
        match self {
            Self::Amount(_) => TrackedField::Amount,
            Self::TransactionDate(_) => TrackedField::TransactionDate,
            Self::PaymentMethod(_) => TrackedField::PaymentMethod,
            Self::Description(_) => TrackedField::Description,
            Self::Source(_) => TrackedField::Source,
            Self::Client(_) => TrackedField::Client,
            Self::Invoice(_) => TrackedField::Invoice,
            Self::ReceiptNumber(_) => TrackedField::ReceiptNumber,
            Self::ReferenceNumber(_) => TrackedField::ReferenceNumber,
            Self::BankName(_) => TrackedField::BankName,
            Self::AccountName(_) => TrackedField::AccountName,
            Self::Notes(_) => TrackedField::Notes,
            Self::Attachments(_) => TrackedField::Attachments,
        }
    }

    /// Returns `(old, new)` JSON values if this update changes `entry`.
    fn change_against(&self, entry: &LedgerEntry) -> Option<(Value, Value)> {
        fn text(old: Option<&String>, new: Option<&String>) -> Option<(Value, Value)> {
            (old != new).then(|| (json!(old), json!(new)))
        }

        match self {
            // Decimal equality is numeric, so 100 and 100.00 are the same amount.
            Self::Amount(new) => (entry.amount != *new).then(|| (json!(entry.amount), json!(new))),
            Self::TransactionDate(new) => (entry.transaction_date != *new)
                .then(|| (json!(entry.transaction_date), json!(new))),
            Self::PaymentMethod(new) => (entry.payment_method != *new)
                .then(|| (json!(entry.payment_method), json!(new))),
            Self::Description(new) => text(entry.description.as_ref(), new.as_ref()),
            Self::Source(new) => text(entry.source.as_ref(), new.as_ref()),
            Self::Client(new) => {
                (entry.client_id != *new).then(|| (json!(entry.client_id), json!(new)))
            }
            Self::Invoice(new) => {
                (entry.invoice_id != *new).then(|| (json!(entry.invoice_id), json!(new)))
            }
            Self::ReceiptNumber(new) => text(entry.receipt_number.as_ref(), new.as_ref()),
            Self::ReferenceNumber(new) => text(entry.reference_number.as_ref(), new.as_ref()),
            Self::BankName(new) => text(entry.bank_name.as_ref(), new.as_ref()),
            Self::AccountName(new) => text(entry.account_name.as_ref(), new.as_ref()),
            Self::Notes(new) => text(entry.notes.as_ref(), new.as_ref()),
            Self::Attachments(new) => {
                (entry.attachments != *new).then(|| (json!(entry.attachments), json!(new)))
            }
        }
    }

    fn apply_to(self, entry: &mut LedgerEntry) {
        match self {
            Self::Amount(v) => entry.amount = v,
            Self::TransactionDate(v) => entry.transaction_date = v,
            Self::PaymentMethod(v) => entry.payment_method = v,
            Self::Description(v) => entry.description = v,
            Self::Source(v) => {
                entry.source = v;
                entry.refresh_classification();
            }
            Self::Client(v) => entry.client_id = v,
            Self::Invoice(v) => entry.invoice_id = v,
            Self::ReceiptNumber(v) => entry.receipt_number = v,
            Self::ReferenceNumber(v) => entry.reference_number = v,
            Self::BankName(v) => entry.bank_name = v,
            Self::AccountName(v) => entry.account_name = v,
            Self::Notes(v) => entry.notes = v,
            Self::Attachments(v) => entry.attachments = v,
        }
    }
}

/// Keeps the last update for each field, in table order.
fn last_per_field(updates: Vec<FieldUpdate>) -> Vec<FieldUpdate> {
    let mut slots: [Option<FieldUpdate>; TrackedField::ALL.len()] = Default::default();
    for update in updates {
        let index = update.field() as usize;
        slots[index] = Some(update);
    }
    slots.into_iter().flatten().collect()
}

/// Field-level differences between `entry` and `updates`.
///
/// Only fields whose value actually differs are returned. When a field is
/// updated more than once, the last update wins.
#[must_use]
pub fn diff(entry: &LedgerEntry, updates: &[FieldUpdate]) -> Vec<FieldChange> {
    last_per_field(updates.to_vec())
        .iter()
        .filter_map(|update| {
            update
                .change_against(entry)
                .map(|(old_value, new_value)| FieldChange {
                    field: update.field().as_str().to_string(),
                    old_value,
                    new_value,
                })
        })
        .collect()
}

/// Applies `updates` to `entry`.
pub fn apply(entry: &mut LedgerEntry, updates: Vec<FieldUpdate>) {
    for update in last_per_field(updates) {
        update.apply_to(entry);
    }
}

/// Partial update as it arrives over the wire.
///
/// An absent field is left alone. For optional fields, `null` or a blank
/// string clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerEntryPatch {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New business date.
    pub transaction_date: Option<NaiveDate>,
    /// New payment method.
    pub payment_method: Option<PaymentMethod>,
    /// New description.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    /// New source/category.
    #[serde(default, deserialize_with = "present")]
    pub source: Option<Option<String>>,
    /// New client link.
    #[serde(default, deserialize_with = "present")]
    pub client_id: Option<Option<ClientId>>,
    /// New invoice link.
    #[serde(default, deserialize_with = "present")]
    pub invoice_id: Option<Option<InvoiceId>>,
    /// New receipt number.
    #[serde(default, deserialize_with = "present")]
    pub receipt_number: Option<Option<String>>,
    /// New reference number.
    #[serde(default, deserialize_with = "present")]
    pub reference_number: Option<Option<String>>,
    /// New bank name.
    #[serde(default, deserialize_with = "present")]
    pub bank_name: Option<Option<String>>,
    /// New account name.
    #[serde(default, deserialize_with = "present")]
    pub account_name: Option<Option<String>>,
    /// New notes.
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    /// Replacement attachments.
    pub attachments: Option<Vec<String>>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl LedgerEntryPatch {
    /// Converts the patch into field updates, in table order.
    #[must_use]
    pub fn into_updates(self) -> Vec<FieldUpdate> {
        let text = |v: Option<Option<String>>, f: fn(Option<String>) -> FieldUpdate| {
            v.map(|v| f(clean_text(v)))
        };

        [
            self.amount.map(FieldUpdate::Amount),
            self.transaction_date.map(FieldUpdate::TransactionDate),
            self.payment_method.map(FieldUpdate::PaymentMethod),
            text(self.description, FieldUpdate::Description),
            text(self.source, FieldUpdate::Source),
            self.client_id.map(FieldUpdate::Client),
            self.invoice_id.map(FieldUpdate::Invoice),
            text(self.receipt_number, FieldUpdate::ReceiptNumber),
            text(self.reference_number, FieldUpdate::ReferenceNumber),
            text(self.bank_name, FieldUpdate::BankName),
            text(self.account_name, FieldUpdate::AccountName),
            text(self.notes, FieldUpdate::Notes),
            self.attachments.map(FieldUpdate::Attachments),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
