//! `SeaORM` entities for the ledger schema.

pub mod audit_logs;
pub mod clients;
pub mod invoices;
pub mod ledger_entries;
pub mod sea_orm_active_enums;
pub mod users;
