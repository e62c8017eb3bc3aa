//! Ledger engine: the operations callers invoke.

pub mod service;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod tests;

pub use service::LedgerEngine;
