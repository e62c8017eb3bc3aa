//! Reconciliation routes.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;

use guardbook_core::LedgerStore;
use guardbook_core::reconciliation::{DailyReport, MonthlyReport};

use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the reconciliation routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/reconciliation/daily/{date}", get(daily::<S>))
        .route("/reconciliation/monthly", get(monthly::<S>))
}

/// Month selector for the monthly report.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// Month number, 1-12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
}

/// GET `/reconciliation/daily/{date}` - Money-in totals for one business day.
async fn daily<S: LedgerStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    date: Result<Path<NaiveDate>, PathRejection>,
) -> Result<Json<DailyReport>, ApiError> {
    let actor = auth.actor()?;
    let Path(date) = date?;
    Ok(Json(state.engine.daily_reconciliation(date, &actor).await?))
}

/// GET `/reconciliation/monthly?month&year` - Month against the month before.
async fn monthly<S: LedgerStore>(
    State(state): State<AppState<S>>,
    auth: AuthUser,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<MonthlyReport>, ApiError> {
    let actor = auth.actor()?;
    let Query(MonthQuery { month, year }) = query?;
    Ok(Json(
        state
            .engine
            .monthly_reconciliation(month, year, &actor)
            .await?,
    ))
}
