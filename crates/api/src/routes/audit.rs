//! Audit log routes. Read-only: there is no write path over HTTP.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};

use guardbook_core::LedgerStore;
use guardbook_core::audit::{AuditFilter, AuditLogRecord};
use guardbook_shared::types::{PageRequest, PageResponse};

use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the audit log routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new().route("/audit-logs", get(list_audit_logs::<S>))
}

/// GET `/audit-logs` - Filtered audit records, newest first.
async fn list_audit_logs<S: LedgerStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    filter: Result<Query<AuditFilter>, QueryRejection>,
    page: Result<Query<PageRequest>, QueryRejection>,
) -> Result<Json<PageResponse<AuditLogRecord>>, ApiError> {
    let actor = auth.actor()?;
    let Query(filter) = filter?;
    let Query(page) = page?;

    let page = PageRequest::new(page.page, page.per_page);
    Ok(Json(state.engine.audit_logs(&filter, page, &actor).await?))
}
