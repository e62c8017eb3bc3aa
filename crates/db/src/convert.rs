//! Row <-> domain conversions.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use serde_json::Value;

use guardbook_core::StoreError;
use guardbook_core::audit::{AuditAction, AuditLogRecord, EntityType};
use guardbook_core::invoice::{Invoice, InvoiceStatus};
use guardbook_core::ledger::{Client, Direction, LedgerEntry, PaymentMethod, Tombstone};
use guardbook_shared::types::{AuditLogId, ClientId, Currency, InvoiceId, LedgerEntryId, UserId};

use crate::entities::{audit_logs, clients, invoices, ledger_entries, sea_orm_active_enums as db};

impl From<Direction> for db::EntryDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::MoneyIn => Self::MoneyIn,
            Direction::MoneyOut => Self::MoneyOut,
        }
    }
}

impl From<db::EntryDirection> for Direction {
    fn from(direction: db::EntryDirection) -> Self {
        match direction {
            db::EntryDirection::MoneyIn => Self::MoneyIn,
            db::EntryDirection::MoneyOut => Self::MoneyOut,
        }
    }
}

impl From<PaymentMethod> for db::PaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::BankTransfer => Self::BankTransfer,
            PaymentMethod::Cheque => Self::Cheque,
            PaymentMethod::MobileMoney => Self::MobileMoney,
            PaymentMethod::Pos => Self::Pos,
            PaymentMethod::Other => Self::Other,
        }
    }
}

impl From<db::PaymentMethod> for PaymentMethod {
    fn from(method: db::PaymentMethod) -> Self {
        match method {
            db::PaymentMethod::Cash => Self::Cash,
            db::PaymentMethod::BankTransfer => Self::BankTransfer,
            db::PaymentMethod::Cheque => Self::Cheque,
            db::PaymentMethod::MobileMoney => Self::MobileMoney,
            db::PaymentMethod::Pos => Self::Pos,
            db::PaymentMethod::Other => Self::Other,
        }
    }
}

impl From<InvoiceStatus> for db::InvoiceStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Pending => Self::Pending,
            InvoiceStatus::Sent => Self::Sent,
            InvoiceStatus::Overdue => Self::Overdue,
            InvoiceStatus::Paid => Self::Paid,
            InvoiceStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<db::InvoiceStatus> for InvoiceStatus {
    fn from(status: db::InvoiceStatus) -> Self {
        match status {
            db::InvoiceStatus::Pending => Self::Pending,
            db::InvoiceStatus::Sent => Self::Sent,
            db::InvoiceStatus::Overdue => Self::Overdue,
            db::InvoiceStatus::Paid => Self::Paid,
            db::InvoiceStatus::Cancelled => Self::Cancelled,
        }
    }
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Serialization(format!("{what}: {detail}"))
}

pub(crate) fn entry_from_model(model: ledger_entries::Model) -> Result<LedgerEntry, StoreError> {
    let currency: Currency = model
        .currency
        .parse()
        .map_err(|e| corrupt("ledger_entries.currency", e))?;
    let deletion = match (model.deleted_at, model.deleted_by, model.deletion_reason) {
        (Some(deleted_at), Some(deleted_by), Some(reason)) => Some(Tombstone {
            deleted_at: deleted_at.with_timezone(&Utc),
            deleted_by: UserId::from_uuid(deleted_by),
            reason,
        }),
        (None, None, None) => None,
        _ => {
            return Err(corrupt(
                "ledger_entries tombstone",
                format!("partial tombstone on {}", model.id),
            ));
        }
    };

    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(model.id),
        direction: model.direction.into(),
        amount: model.amount.normalize(),
        currency,
        transaction_date: model.transaction_date,
        payment_method: model.payment_method.into(),
        source: model.source,
        description: model.description,
        client_id: model.client_id.map(ClientId::from_uuid),
        invoice_id: model.invoice_id.map(InvoiceId::from_uuid),
        receipt_number: model.receipt_number,
        reference_number: model.reference_number,
        bank_name: model.bank_name,
        account_name: model.account_name,
        notes: model.notes,
        attachments: serde_json::from_value(model.attachments)?,
        is_classified: model.is_classified,
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        edit_history: serde_json::from_value(model.edit_history)?,
        deletion,
    })
}

pub(crate) fn entry_to_active(entry: &LedgerEntry) -> Result<ledger_entries::ActiveModel, StoreError> {
    let deletion = entry.deletion.as_ref();
    Ok(ledger_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        direction: Set(entry.direction.into()),
        amount: Set(entry.amount),
        currency: Set(entry.currency.code().to_string()),
        transaction_date: Set(entry.transaction_date),
        payment_method: Set(entry.payment_method.into()),
        source: Set(entry.source.clone()),
        description: Set(entry.description.clone()),
        client_id: Set(entry.client_id.map(ClientId::into_inner)),
        invoice_id: Set(entry.invoice_id.map(InvoiceId::into_inner)),
        receipt_number: Set(entry.receipt_number.clone()),
        reference_number: Set(entry.reference_number.clone()),
        bank_name: Set(entry.bank_name.clone()),
        account_name: Set(entry.account_name.clone()),
        notes: Set(entry.notes.clone()),
        attachments: Set(serde_json::to_value(&entry.attachments)?),
        is_classified: Set(entry.is_classified),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(entry.created_at.fixed_offset()),
        updated_at: Set(entry.updated_at.fixed_offset()),
        edit_history: Set(serde_json::to_value(&entry.edit_history)?),
        deleted_at: Set(deletion.map(|t| t.deleted_at.fixed_offset())),
        deleted_by: Set(deletion.map(|t| t.deleted_by.into_inner())),
        deletion_reason: Set(deletion.map(|t| t.reason.clone())),
    })
}

pub(crate) fn invoice_from_model(model: invoices::Model) -> Invoice {
    Invoice {
        id: InvoiceId::from_uuid(model.id),
        invoice_number: model.invoice_number,
        client_id: ClientId::from_uuid(model.client_id),
        amount: model.amount.normalize(),
        paid_amount: model.paid_amount.normalize(),
        status: model.status.into(),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

/// Only the balance columns change once an invoice exists.
pub(crate) fn invoice_balance_update(invoice: &Invoice) -> invoices::ActiveModel {
    invoices::ActiveModel {
        id: sea_orm::ActiveValue::Unchanged(invoice.id.into_inner()),
        paid_amount: Set(invoice.paid_amount),
        status: Set(invoice.status.into()),
        updated_at: Set(invoice.updated_at.fixed_offset()),
        ..Default::default()
    }
}

pub(crate) fn client_from_model(model: clients::Model) -> Client {
    Client {
        id: ClientId::from_uuid(model.id),
        name: model.name,
    }
}

pub(crate) fn audit_from_model(model: audit_logs::Model) -> Result<AuditLogRecord, StoreError> {
    let action = AuditAction::parse(&model.action)
        .ok_or_else(|| corrupt("audit_logs.action", &model.action))?;
    let entity_type = EntityType::parse(&model.entity_type)
        .ok_or_else(|| corrupt("audit_logs.entity_type", &model.entity_type))?;
    Ok(AuditLogRecord {
        id: AuditLogId::from_uuid(model.id),
        actor_id: UserId::from_uuid(model.actor_id),
        action,
        entity_type,
        entity_id: model.entity_id,
        metadata: model.metadata,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub(crate) fn audit_to_active(record: &AuditLogRecord) -> audit_logs::ActiveModel {
    audit_logs::ActiveModel {
        id: Set(record.id.into_inner()),
        actor_id: Set(record.actor_id.into_inner()),
        action: Set(record.action.as_str().to_string()),
        entity_type: Set(record.entity_type.as_str().to_string()),
        entity_id: Set(record.entity_id),
        metadata: Set(match &record.metadata {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        }),
        created_at: Set(record.created_at.fixed_offset()),
    }
}
