//! Shared types, errors, and configuration for Guardbook.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes and decimal percentage helpers
//! - Typed IDs for ledger entries, invoices, clients and users
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - Bearer token validation for the externally issued access tokens

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
