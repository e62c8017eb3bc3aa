//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for the ledger, reconciliation and audit log
//! - Bearer-token authentication middleware
//! - The JSON error envelope

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use guardbook_core::{LedgerEngine, LedgerStore};
use guardbook_shared::JwtService;

pub use error::ApiError;

/// Application state shared across handlers.
pub struct AppState<S: LedgerStore> {
    /// Ledger engine over the configured store.
    pub engine: Arc<LedgerEngine<S>>,
    /// Verifies bearer tokens from the identity service.
    pub jwt_service: Arc<JwtService>,
}

impl<S: LedgerStore> AppState<S> {
    /// Creates state from an engine and token verifier.
    pub fn new(engine: LedgerEngine<S>, jwt_service: JwtService) -> Self {
        Self {
            engine: Arc::new(engine),
            jwt_service: Arc::new(jwt_service),
        }
    }
}

impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            jwt_service: Arc::clone(&self.jwt_service),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
