//! Ledger entry routes.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use guardbook_core::LedgerStore;
use guardbook_core::ledger::{
    CreateLedgerEntryInput, EntryFilter, LedgerEntryPatch, LedgerEntryView, QueryResult,
};
use guardbook_shared::types::{LedgerEntryId, PageRequest};

use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the ledger routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/ledger/entries",
            get(list_entries::<S>).post(create_entry::<S>),
        )
        .route(
            "/ledger/entries/{entry_id}",
            get(get_entry::<S>)
                .put(edit_entry::<S>)
                .delete(delete_entry::<S>),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Archive visibility flag on the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ArchiveQuery {
    /// Include archived entries; honoured only for roles that may view archives.
    #[serde(default)]
    pub include_deleted: bool,
}

/// Body of an edit: the reason plus any subset of editable fields.
#[derive(Debug, Deserialize)]
pub struct EditEntryRequest {
    /// Why the entry is being corrected.
    #[serde(default)]
    pub reason: String,
    /// Fields to change.
    #[serde(flatten)]
    pub patch: LedgerEntryPatch,
}

/// Body of a soft delete.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteEntryRequest {
    /// Why the entry is being archived.
    #[serde(default)]
    pub reason: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/ledger/entries` - Record a money-in or money-out entry.
async fn create_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    payload: Result<Json<CreateLedgerEntryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<LedgerEntryView>), ApiError> {
    let actor = auth.actor()?;
    let Json(input) = payload?;
    let view = state.engine.create(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET `/ledger/entries` - Filtered, paginated listing with a summary.
async fn list_entries<S: LedgerStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    filter: Result<Query<EntryFilter>, QueryRejection>,
    page: Result<Query<PageRequest>, QueryRejection>,
    archive: Result<Query<ArchiveQuery>, QueryRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let actor = auth.actor()?;
    let Query(filter) = filter?;
    let Query(page) = page?;
    let Query(archive) = archive?;

    let page = PageRequest::new(page.page, page.per_page);
    let result = state
        .engine
        .query(&filter, page, archive.include_deleted, &actor)
        .await?;
    Ok(Json(result))
}

/// GET `/ledger/entries/{entry_id}` - One entry with resolved references.
async fn get_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    entry_id: Result<Path<LedgerEntryId>, PathRejection>,
) -> Result<Json<LedgerEntryView>, ApiError> {
    let actor = auth.actor()?;
    let Path(entry_id) = entry_id?;
    Ok(Json(state.engine.get(entry_id, &actor).await?))
}

/// PUT `/ledger/entries/{entry_id}` - Correct an entry, with a reason.
async fn edit_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    entry_id: Result<Path<LedgerEntryId>, PathRejection>,
    payload: Result<Json<EditEntryRequest>, JsonRejection>,
) -> Result<Json<LedgerEntryView>, ApiError> {
    let actor = auth.actor()?;
    let Path(entry_id) = entry_id?;
    let Json(request) = payload?;

    let view = state
        .engine
        .edit(entry_id, request.patch.into_updates(), &actor, &request.reason)
        .await?;
    Ok(Json(view))
}

/// DELETE `/ledger/entries/{entry_id}` - Archive an entry, with a reason.
async fn delete_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    entry_id: Result<Path<LedgerEntryId>, PathRejection>,
    payload: Result<Json<DeleteEntryRequest>, JsonRejection>,
) -> Result<Json<LedgerEntryView>, ApiError> {
    let actor = auth.actor()?;
    let Path(entry_id) = entry_id?;
    // A bodiless DELETE falls through to the missing-reason check.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => DeleteEntryRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };

    let view = state
        .engine
        .soft_delete(entry_id, &actor, &request.reason)
        .await?;
    Ok(Json(view))
}
