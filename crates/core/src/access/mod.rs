//! Role-based access to ledger capabilities.
//!
//! The role→capability table lives in [`Role::grants`] and nowhere else.
//! Every engine operation starts with [`require_capability`].

mod role;

pub use role::{Actor, Capability, Role, require_capability};
