//! Reconciliation report types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use guardbook_shared::types::ClientId;

use crate::ledger::MethodTotals;

/// Daily money-in reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    /// Reconciled business date.
    pub date: NaiveDate,
    /// Money-in totals per payment method.
    pub totals: MethodTotals,
    /// Sum of all money-in for the day.
    pub grand_total: Decimal,
    /// Number of money-in entries.
    pub record_count: u64,
    /// Entries without a source.
    pub unclassified_count: u64,
    /// Entries without any evidence attachment.
    pub missing_evidence_count: u64,
    /// Advisory: the day is past and nothing is outstanding.
    pub is_closed: bool,
    /// The date is today in the business timezone.
    pub is_today: bool,
}

/// Money movement totals for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    /// All money-in.
    pub money_in: Decimal,
    /// Money-out excluding the salary category.
    pub money_out: Decimal,
    /// Money-out in the salary category.
    pub salary: Decimal,
}

/// Direction of a period-over-period change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Up by more than one percent.
    Increase,
    /// Down by more than one percent.
    Decrease,
    /// Within one percent either way.
    Stable,
}

/// One figure compared against the previous month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodComparison {
    /// This month.
    pub current: Decimal,
    /// Previous month.
    pub previous: Decimal,
    /// `current - previous`.
    pub difference: Decimal,
    /// Change relative to the previous month, in percent.
    pub percentage_change: Decimal,
    /// Classified direction of the change.
    pub trend: Trend,
}

/// Month-over-month comparison of every headline figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyComparison {
    /// Money-in comparison.
    pub money_in: PeriodComparison,
    /// Non-salary money-out comparison.
    pub money_out: PeriodComparison,
    /// Salary comparison.
    pub salary: PeriodComparison,
}

/// Money-out grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    /// Category name; `uncategorized` when none was set.
    pub category: String,
    /// Total for the category.
    pub total: Decimal,
    /// Number of entries.
    pub count: u64,
    /// Share of all money-out, in percent.
    pub percentage: Decimal,
}

/// Money-in grouped by client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientBreakdown {
    /// Client id; `None` for entries without a client.
    pub client_id: Option<ClientId>,
    /// Resolved client name.
    pub client_name: String,
    /// Total for the client.
    pub total: Decimal,
    /// Number of entries.
    pub count: u64,
    /// Share of all money-in, in percent.
    pub percentage: Decimal,
}

/// Monthly reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    /// Month, 1-12.
    pub month: u32,
    /// Year.
    pub year: i32,
    /// First day of the month.
    pub period_start: NaiveDate,
    /// Last day of the month.
    pub period_end: NaiveDate,
    /// This month's totals.
    pub current: PeriodTotals,
    /// Previous month's totals.
    pub previous: PeriodTotals,
    /// This month's money-out by category.
    pub categories: Vec<CategoryBreakdown>,
    /// This month's money-in by client.
    pub clients: Vec<ClientBreakdown>,
    /// Month-over-month comparison.
    pub comparison: MonthlyComparison,
}
