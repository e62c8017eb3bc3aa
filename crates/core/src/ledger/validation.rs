//! Business rule validation for ledger entries.
//!
//! Rules are checked in a fixed order and the first failure wins.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::{ValidationError, ValidationRule};
use super::types::{CreateLedgerEntryInput, Direction, LedgerEntry, MoneyInSource, PaymentMethod, has_text};
use guardbook_shared::types::ClientId;

/// Required fields of a create request once validation has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Money-in or money-out.
    pub direction: Direction,
    /// Business date.
    pub transaction_date: NaiveDate,
    /// Payment method.
    pub payment_method: PaymentMethod,
}

/// The fields every rule looks at, borrowed from either an input or an entry.
struct Candidate<'a> {
    direction: Option<Direction>,
    amount: Decimal,
    transaction_date: Option<NaiveDate>,
    payment_method: Option<PaymentMethod>,
    source: Option<&'a str>,
    client_id: Option<ClientId>,
    receipt_number: Option<&'a str>,
    reference_number: Option<&'a str>,
    attachment_count: usize,
}

fn check(candidate: &Candidate<'_>) -> Result<Resolved, ValidationError> {
    let direction = candidate.direction.ok_or(ValidationRule::DirectionRequired)?;
    if candidate.amount <= Decimal::ZERO {
        return Err(ValidationRule::AmountPositive.into());
    }
    let date = candidate
        .transaction_date
        .ok_or(ValidationRule::TransactionDateRequired)?;
    let method = candidate
        .payment_method
        .ok_or(ValidationRule::PaymentMethodRequired)?;

    if direction == Direction::MoneyIn && candidate.attachment_count == 0 {
        return Err(ValidationRule::EvidenceRequired.into());
    }
    if method.requires_receipt() && !has_text(candidate.receipt_number) {
        return Err(ValidationRule::ReceiptNumberRequired.into());
    }
    if method.requires_reference() && !has_text(candidate.reference_number) {
        return Err(ValidationRule::ReferenceNumberRequired.into());
    }

    if direction == Direction::MoneyIn {
        if let Some(source) = candidate.source.filter(|s| !s.trim().is_empty()) {
            let source = MoneyInSource::parse(source).ok_or(ValidationRule::UnknownSource)?;
            if source.requires_client() && candidate.client_id.is_none() {
                return Err(ValidationRule::ClientRequired.into());
            }
        }
    }

    Ok(Resolved {
        direction,
        transaction_date: date,
        payment_method: method,
    })
}

/// Validates a create request.
///
/// Returns the resolved required fields on success.
///
/// # Errors
///
/// Returns the first failing rule.
pub fn validate_new(input: &CreateLedgerEntryInput) -> Result<Resolved, ValidationError> {
    check(&Candidate {
        direction: input.direction,
        amount: input.amount,
        transaction_date: input.transaction_date,
        payment_method: input.payment_method,
        source: input.source.as_deref(),
        client_id: input.client_id,
        receipt_number: input.receipt_number.as_deref(),
        reference_number: input.reference_number.as_deref(),
        attachment_count: input.attachments.len(),
    })
}

/// Re-validates an entry after an edit with the same rules as create.
///
/// # Errors
///
/// Returns the first failing rule.
pub fn validate_entry(entry: &LedgerEntry) -> Result<(), ValidationError> {
    check(&Candidate {
        direction: Some(entry.direction),
        amount: entry.amount,
        transaction_date: Some(entry.transaction_date),
        payment_method: Some(entry.payment_method),
        source: entry.source.as_deref(),
        client_id: entry.client_id,
        receipt_number: entry.receipt_number.as_deref(),
        reference_number: entry.reference_number.as_deref(),
        attachment_count: entry.attachments.len(),
    })
    .map(|_| ())
}

/// Requires a non-blank reason for edits and deletions.
///
/// # Errors
///
/// Returns `ReasonRequired` for a blank reason.
pub fn validate_reason(reason: &str) -> Result<&str, ValidationError> {
    let reason = reason.trim();
    if reason.is_empty() {
        Err(ValidationRule::ReasonRequired.into())
    } else {
        Ok(reason)
    }
}
