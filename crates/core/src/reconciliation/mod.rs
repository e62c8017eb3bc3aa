//! Daily and monthly reconciliation reports.
//!
//! Reports are computed summaries for manual verification. The closed-day
//! flag is advisory and never blocks writes.

pub mod service;
pub mod types;


pub use service::{MonthPeriod, ReconciliationService, UNASSIGNED_CLIENT, UNCATEGORIZED, compare};
pub use types::{
    CategoryBreakdown, ClientBreakdown, DailyReport, MonthlyComparison, MonthlyReport,
    PeriodComparison, PeriodTotals, Trend,
};
