//! Ledger schema: staff users, clients, invoices, ledger entries and the audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ====================================================================
        // PART 1: PARTIES
        // ====================================================================
        db.execute_unprepared(PARTIES_SQL).await?;

        // ====================================================================
        // PART 2: INVOICES
        // ====================================================================
        db.execute_unprepared(INVOICES_SQL).await?;

        // ====================================================================
        // PART 3: LEDGER ENTRIES
        // ====================================================================
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;

        // ====================================================================
        // PART 4: AUDIT LOG
        // ====================================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS audit_logs CASCADE;
             DROP TABLE IF EXISTS ledger_entries CASCADE;
             DROP TABLE IF EXISTS invoices CASCADE;
             DROP TABLE IF EXISTS clients CASCADE;
             DROP TABLE IF EXISTS users CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const PARTIES_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    full_name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE clients (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    invoice_number VARCHAR(64) NOT NULL UNIQUE,
    client_id UUID NOT NULL REFERENCES clients(id),
    amount NUMERIC(19, 4) NOT NULL,
    paid_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    status VARCHAR(16) NOT NULL DEFAULT 'PENDING',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_invoice_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_invoice_paid_non_negative CHECK (paid_amount >= 0),
    CONSTRAINT chk_invoice_status CHECK (status IN ('PENDING', 'SENT', 'OVERDUE', 'PAID', 'CANCELLED'))
);

CREATE INDEX idx_invoices_client ON invoices(client_id);
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    direction VARCHAR(16) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    currency VARCHAR(3) NOT NULL,
    transaction_date DATE NOT NULL,
    payment_method VARCHAR(32) NOT NULL,
    source VARCHAR(100),
    description TEXT,
    client_id UUID REFERENCES clients(id),
    invoice_id UUID REFERENCES invoices(id),
    receipt_number VARCHAR(100),
    reference_number VARCHAR(100),
    bank_name VARCHAR(255),
    account_name VARCHAR(255),
    notes TEXT,
    attachments JSONB NOT NULL DEFAULT '[]'::jsonb,
    is_classified BOOLEAN NOT NULL DEFAULT false,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    edit_history JSONB NOT NULL DEFAULT '[]'::jsonb,
    deleted_at TIMESTAMPTZ,
    deleted_by UUID,
    deletion_reason TEXT,
    CONSTRAINT chk_entry_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_entry_direction CHECK (direction IN ('MONEY_IN', 'MONEY_OUT')),
    CONSTRAINT chk_entry_tombstone CHECK (
        (deleted_at IS NULL AND deleted_by IS NULL AND deletion_reason IS NULL)
        OR (deleted_at IS NOT NULL AND deleted_by IS NOT NULL AND deletion_reason IS NOT NULL)
    )
);

-- Listing and reconciliation read live rows by date
CREATE INDEX idx_ledger_entries_date ON ledger_entries(transaction_date DESC, created_at DESC)
    WHERE deleted_at IS NULL;

-- Invoice balance reads
CREATE INDEX idx_ledger_entries_invoice ON ledger_entries(invoice_id)
    WHERE invoice_id IS NOT NULL AND deleted_at IS NULL;

CREATE INDEX idx_ledger_entries_client ON ledger_entries(client_id)
    WHERE client_id IS NOT NULL;
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    actor_id UUID NOT NULL,
    action VARCHAR(64) NOT NULL,
    entity_type VARCHAR(32) NOT NULL,
    entity_id UUID NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_logs_entity ON audit_logs(entity_type, entity_id, created_at DESC);
CREATE INDEX idx_audit_logs_actor ON audit_logs(actor_id, created_at DESC);
CREATE INDEX idx_audit_logs_created ON audit_logs(created_at DESC);
";
