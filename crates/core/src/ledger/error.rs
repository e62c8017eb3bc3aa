//! Ledger error types.
//!
//! Every failure aborts the enclosing unit of work. Nothing here is retryable:
//! a financial mutation must never be silently re-applied.

use guardbook_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::access::Capability;
use crate::store::StoreError;

/// A single failed validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// Money-in or money-out must be stated.
    DirectionRequired,
    /// Amount must be strictly positive.
    AmountPositive,
    /// A business date must be supplied.
    TransactionDateRequired,
    /// A payment method must be supplied.
    PaymentMethodRequired,
    /// Money-in entries need at least one evidence attachment.
    EvidenceRequired,
    /// Cash entries need a receipt number.
    ReceiptNumberRequired,
    /// Bank transfer and POS entries need an external reference number.
    ReferenceNumberRequired,
    /// Money-in source must be one of the known sources.
    UnknownSource,
    /// Client- or invoice-derived money-in needs a client.
    ClientRequired,
    /// Edits and deletions need a reason.
    ReasonRequired,
    /// Month outside `1..=12` or unrepresentable year.
    InvalidPeriod,
}

impl ValidationRule {
    /// Machine-readable rule code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DirectionRequired => "direction_required",
            Self::AmountPositive => "amount_positive",
            Self::TransactionDateRequired => "transaction_date_required",
            Self::PaymentMethodRequired => "payment_method_required",
            Self::EvidenceRequired => "evidence_required",
            Self::ReceiptNumberRequired => "receipt_number_required",
            Self::ReferenceNumberRequired => "reference_number_required",
            Self::UnknownSource => "unknown_source",
            Self::ClientRequired => "client_required",
            Self::ReasonRequired => "reason_required",
            Self::InvalidPeriod => "invalid_period",
        }
    }

    /// Field the rule is attached to.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::DirectionRequired => "direction",
            Self::AmountPositive => "amount",
            Self::TransactionDateRequired => "transaction_date",
            Self::PaymentMethodRequired => "payment_method",
            Self::EvidenceRequired => "attachments",
            Self::ReceiptNumberRequired => "receipt_number",
            Self::ReferenceNumberRequired => "reference_number",
            Self::UnknownSource => "source",
            Self::ClientRequired => "client_id",
            Self::ReasonRequired => "reason",
            Self::InvalidPeriod => "month",
        }
    }

    /// Human-readable message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::DirectionRequired => "Direction must be MONEY_IN or MONEY_OUT",
            Self::AmountPositive => "Amount must be greater than zero",
            Self::TransactionDateRequired => "Transaction date is required",
            Self::PaymentMethodRequired => "Payment method is required",
            Self::EvidenceRequired => "At least one evidence attachment is required for money-in",
            Self::ReceiptNumberRequired => "Receipt number is required for cash payments",
            Self::ReferenceNumberRequired => {
                "Reference number is required for bank transfer and POS payments"
            }
            Self::UnknownSource => "Source is not a recognised money-in source",
            Self::ClientRequired => "Client is required for client or invoice payments",
            Self::ReasonRequired => "A reason is required",
            Self::InvalidPeriod => "Month must be between 1 and 12",
        }
    }
}

/// Validation failure naming the first rule that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub struct ValidationError {
    /// The failed rule.
    pub rule: ValidationRule,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule.field(), self.rule.message())
    }
}

impl From<ValidationRule> for ValidationError {
    fn from(rule: ValidationRule) -> Self {
        Self { rule }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or incomplete input.
    #[error("Validation failed on {0}")]
    Validation(#[from] ValidationError),

    /// Role string the capability table does not know.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Caller's role lacks the required capability.
    #[error("Role {role} lacks capability {capability}")]
    Authorization {
        /// The caller's role.
        role: String,
        /// The capability that was required.
        capability: Capability,
    },

    /// Entity missing or already archived.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Requested id.
        id: Uuid,
    },

    /// Edit without any effective change.
    #[error("Edit does not change any tracked field")]
    NoOp,

    /// Referenced entity missing or in an incompatible state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValidationRule> for LedgerError {
    fn from(rule: ValidationRule) -> Self {
        Self::Validation(rule.into())
    }
}

impl LedgerError {
    /// Shorthand for a missing ledger entry.
    #[must_use]
    pub fn entry_not_found(id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity: "Ledger entry",
            id: id.into(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnknownRole(_) | Self::Authorization { .. } => "AUTHORIZATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NoOp => "NO_OP",
            Self::Conflict(_) => "CONFLICT",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::UnknownRole(_) | Self::Authorization { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::NoOp => 422,
            Self::Store(_) => 500,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(v) => AppError::Validation {
                field: v.rule.field().to_string(),
                rule: v.rule.code().to_string(),
                message: v.rule.message().to_string(),
            },
            LedgerError::UnknownRole(_) | LedgerError::Authorization { .. } => {
                AppError::Forbidden(err.to_string())
            }
            LedgerError::NotFound { .. } => AppError::NotFound(err.to_string()),
            LedgerError::NoOp => AppError::NoChanges(err.to_string()),
            LedgerError::Conflict(msg) => AppError::Conflict(msg),
            LedgerError::Store(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LedgerError::Validation(ValidationRule::AmountPositive.into()), 400, "VALIDATION_ERROR")]
    #[case(LedgerError::UnknownRole("janitor".into()), 403, "AUTHORIZATION_ERROR")]
    #[case(LedgerError::Authorization { role: "viewer".into(), capability: Capability::EditLedgerEntry }, 403, "AUTHORIZATION_ERROR")]
    #[case(LedgerError::entry_not_found(Uuid::nil()), 404, "NOT_FOUND")]
    #[case(LedgerError::Conflict("invoice".into()), 409, "CONFLICT")]
    #[case(LedgerError::NoOp, 422, "NO_OP")]
    #[case(LedgerError::Store(StoreError::Backend("down".into())), 500, "STORE_ERROR")]
    fn test_codes_and_statuses(#[case] err: LedgerError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.http_status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_validation_display_names_field() {
        let err = LedgerError::from(ValidationError::from(ValidationRule::ReceiptNumberRequired));
        assert_eq!(
            err.to_string(),
            "Validation failed on receipt_number: Receipt number is required for cash payments"
        );
    }

    #[test]
    fn test_into_app_error_keeps_rule() {
        let app: AppError = LedgerError::from(ValidationError::from(ValidationRule::EvidenceRequired)).into();
        match app {
            AppError::Validation { field, rule, .. } => {
                assert_eq!(field, "attachments");
                assert_eq!(rule, "evidence_required");
            }
            other => panic!("unexpected {other:?}"),
        }
        let app: AppError = LedgerError::NoOp.into();
        assert_eq!(app.status_code(), 422);
    }
}
