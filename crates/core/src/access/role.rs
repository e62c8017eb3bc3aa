//! Roles, capabilities and the single table mapping one to the other.

use serde::{Deserialize, Serialize};
use std::fmt;

use guardbook_shared::types::UserId;

use crate::ledger::LedgerError;

/// Staff role as resolved by the identity service.
///
/// Roles are ordered from lowest to highest privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only dashboard access.
    Viewer = 0,
    /// Site supervisor; can browse the ledger.
    Supervisor = 1,
    /// Records money-in and money-out.
    Accountant = 2,
    /// Corrects recorded entries.
    Manager = 3,
    /// Back-office administrator; reviews the audit trail.
    Admin = 4,
    /// Highest privilege: archives entries and sees archived records.
    SuperAdmin = 5,
}

/// Something a caller may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// List and read ledger entries.
    ViewLedger,
    /// Create ledger entries.
    RecordLedgerEntry,
    /// Edit ledger entries.
    EditLedgerEntry,
    /// Soft-delete ledger entries.
    DeleteLedgerEntry,
    /// See soft-deleted entries.
    ViewArchived,
    /// Run daily and monthly reconciliation.
    ViewReconciliation,
    /// Read the audit log.
    ViewAuditLog,
}

impl Role {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "viewer" => Some(Self::Viewer),
            "supervisor" => Some(Self::Supervisor),
            "accountant" => Some(Self::Accountant),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            "super_admin" | "superadmin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Supervisor => "supervisor",
            Self::Accountant => "accountant",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// The role→capability table.
    #[must_use]
    pub fn grants(self, capability: Capability) -> bool {
        let minimum = match capability {
            Capability::ViewLedger => Self::Supervisor,
            Capability::RecordLedgerEntry | Capability::ViewReconciliation => Self::Accountant,
            Capability::EditLedgerEntry => Self::Manager,
            Capability::ViewAuditLog => Self::Admin,
            Capability::DeleteLedgerEntry | Capability::ViewArchived => Self::SuperAdmin,
        };
        self >= minimum
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Capability {
    /// Returns the string representation of the capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewLedger => "view_ledger",
            Self::RecordLedgerEntry => "record_ledger_entry",
            Self::EditLedgerEntry => "edit_ledger_entry",
            Self::DeleteLedgerEntry => "delete_ledger_entry",
            Self::ViewArchived => "view_archived",
            Self::ViewReconciliation => "view_reconciliation",
            Self::ViewAuditLog => "view_audit_log",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Staff user id.
    pub id: UserId,
    /// Resolved role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor from an already-resolved role.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Creates an actor from the opaque role string the auth layer hands over.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownRole` for roles outside the table.
    pub fn from_role_str(id: UserId, role: &str) -> Result<Self, LedgerError> {
        Role::parse(role)
            .map(|role| Self { id, role })
            .ok_or_else(|| LedgerError::UnknownRole(role.to_string()))
    }

    /// Returns true if the actor's role grants `capability`.
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.role.grants(capability)
    }
}

/// Fails with `LedgerError::Authorization` unless `actor` holds `capability`.
///
/// # Errors
///
/// Returns `LedgerError::Authorization` when the role lacks the capability.
pub fn require_capability(actor: &Actor, capability: Capability) -> Result<(), LedgerError> {
    if actor.can(capability) {
        Ok(())
    } else {
        tracing::warn!(
            actor_id = %actor.id,
            role = %actor.role,
            capability = %capability,
            "Capability check failed"
        );
        Err(LedgerError::Authorization {
            role: actor.role.to_string(),
            capability,
        })
    }
}
