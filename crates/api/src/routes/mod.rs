//! API route definitions.

use axum::{Router, middleware};

use guardbook_core::LedgerStore;

use crate::{AppState, middleware::auth_middleware};

pub mod audit;
pub mod health;
pub mod ledger;
pub mod reconciliation;


/// Creates the API router: health is public, everything else needs a bearer token.
pub fn api_routes<S: LedgerStore>(state: &AppState<S>) -> Router<AppState<S>> {
    let protected_routes = Router::new()
        .merge(ledger::routes())
        .merge(reconciliation::routes())
        .merge(audit::routes())
        .layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
