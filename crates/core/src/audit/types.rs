//! Audit log records.
//!
//! Records are created once and never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use uuid::Uuid;

use guardbook_shared::types::{AuditLogId, UserId};

use crate::invoice::{BalanceChange, BalanceEvent};

/// Action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A ledger entry was recorded.
    LedgerEntryCreated,
    /// A ledger entry was edited.
    LedgerEntryEdited,
    /// A ledger entry was archived.
    LedgerEntryDeleted,
    /// An invoice received more than it is worth.
    InvoiceOverpaid,
    /// An invoice received a payment that leaves it short.
    InvoicePartialPayment,
    /// A payment was taken back off an invoice.
    InvoicePaymentReversed,
}

impl AuditAction {
    /// Returns the action code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LedgerEntryCreated => "LEDGER_ENTRY_CREATED",
            Self::LedgerEntryEdited => "LEDGER_ENTRY_EDITED",
            Self::LedgerEntryDeleted => "LEDGER_ENTRY_DELETED",
            Self::InvoiceOverpaid => "INVOICE_OVERPAID",
            Self::InvoicePartialPayment => "INVOICE_PARTIAL_PAYMENT",
            Self::InvoicePaymentReversed => "INVOICE_PAYMENT_REVERSED",
        }
    }

    /// Parses an action code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LEDGER_ENTRY_CREATED" => Some(Self::LedgerEntryCreated),
            "LEDGER_ENTRY_EDITED" => Some(Self::LedgerEntryEdited),
            "LEDGER_ENTRY_DELETED" => Some(Self::LedgerEntryDeleted),
            "INVOICE_OVERPAID" => Some(Self::InvoiceOverpaid),
            "INVOICE_PARTIAL_PAYMENT" => Some(Self::InvoicePartialPayment),
            "INVOICE_PAYMENT_REVERSED" => Some(Self::InvoicePaymentReversed),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity an audit record is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A ledger entry.
    LedgerEntry,
    /// An invoice.
    Invoice,
}

impl EntityType {
    /// Returns the entity type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LedgerEntry => "ledger_entry",
            Self::Invoice => "invoice",
        }
    }

    /// Parses an entity type name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ledger_entry" => Some(Self::LedgerEntry),
            "invoice" => Some(Self::Invoice),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable audit log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogRecord {
    /// Record id.
    pub id: AuditLogId,
    /// Who performed the action.
    pub actor_id: UserId,
    /// What was done.
    pub action: AuditAction,
    /// Kind of subject entity.
    pub entity_type: EntityType,
    /// Subject entity id.
    pub entity_id: Uuid,
    /// Free-form details.
    pub metadata: Value,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl AuditLogRecord {
    /// Builds a new record stamped with the current time.
    #[must_use]
    pub fn new(
        actor_id: UserId,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: impl Into<Uuid>,
        metadata: Value,
    ) -> Self {
        Self {
            id: AuditLogId::new(),
            actor_id,
            action,
            entity_type,
            entity_id: entity_id.into(),
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Audit records for the events raised by one reconciler step.
    #[must_use]
    pub fn for_balance_change(
        actor_id: UserId,
        change: &BalanceChange,
        ledger_entry_id: Uuid,
    ) -> Vec<Self> {
        let invoice = &change.invoice;
        change
            .events
            .iter()
            .map(|event| {
                let (action, detail) = match event {
                    BalanceEvent::Overpaid { overpayment } => (
                        AuditAction::InvoiceOverpaid,
                        json!({ "overpayment": overpayment }),
                    ),
                    BalanceEvent::PartialPayment { outstanding } => (
                        AuditAction::InvoicePartialPayment,
                        json!({ "outstanding": outstanding }),
                    ),
                    BalanceEvent::PaymentReversed { amount } => (
                        AuditAction::InvoicePaymentReversed,
                        json!({ "reversed_amount": amount }),
                    ),
                };
                let mut metadata = json!({
                    "invoice_number": invoice.invoice_number,
                    "invoice_amount": invoice.amount,
                    "paid_amount": invoice.paid_amount,
                    "previous_paid_amount": change.previous_paid,
                    "status": invoice.status,
                    "previous_status": change.previous_status,
                    "ledger_entry_id": ledger_entry_id,
                });
                merge(&mut metadata, detail);
                Self::new(actor_id, action, EntityType::Invoice, invoice.id, metadata)
            })
            .collect()
    }
}

fn merge(target: &mut Value, extra: Value) {
    if let (Value::Object(target), Value::Object(extra)) = (target, extra) {
        target.extend(extra);
    }
}

/// Read-side filter for compliance review.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    /// Only records by this actor.
    pub actor_id: Option<UserId>,
    /// Only records with this action.
    pub action: Option<AuditAction>,
    /// Only records about this kind of entity.
    pub entity_type: Option<EntityType>,
    /// Only records about this entity.
    pub entity_id: Option<Uuid>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// Returns true if `record` passes every set criterion.
    #[must_use]
    pub fn matches(&self, record: &AuditLogRecord) -> bool {
        self.actor_id.is_none_or(|a| record.actor_id == a)
            && self.action.is_none_or(|a| record.action == a)
            && self.entity_type.is_none_or(|t| record.entity_type == t)
            && self.entity_id.is_none_or(|id| record.entity_id == id)
            && self.from.is_none_or(|from| record.created_at >= from)
            && self.to.is_none_or(|to| record.created_at < to)
    }
}
