//! Daily and monthly reconciliation.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use guardbook_shared::types::ClientId;
use guardbook_shared::types::money::percentage_of;

use super::types::{
    CategoryBreakdown, ClientBreakdown, DailyReport, MonthlyComparison, MonthlyReport,
    PeriodComparison, PeriodTotals, Trend,
};
use crate::ledger::{Direction, LedgerEntry, MethodTotals, ValidationError, ValidationRule};

/// Category name for money-out entries without one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Bucket name for money-in entries without a client.
pub const UNASSIGNED_CLIENT: &str = "Unassigned";

/// Changes within this many percent either way count as stable.
const TREND_DEADBAND: Decimal = Decimal::ONE;

/// A calendar month and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthPeriod {
    /// Month, 1-12.
    pub month: u32,
    /// Year.
    pub year: i32,
    /// First day of the month.
    pub start: NaiveDate,
    /// Last day of the month.
    pub end: NaiveDate,
    /// First day of the previous month.
    pub previous_start: NaiveDate,
    /// Last day of the previous month.
    pub previous_end: NaiveDate,
}

impl MonthPeriod {
    /// Resolves the bounds of `month`/`year` and of the month before.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` for a month outside 1-12 or an unrepresentable year.
    pub fn new(month: u32, year: i32) -> Result<Self, ValidationError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or(ValidationRule::InvalidPeriod)?;
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .ok_or(ValidationRule::InvalidPeriod)?;
        let previous_end = start.pred_opt().ok_or(ValidationRule::InvalidPeriod)?;
        let previous_start = NaiveDate::from_ymd_opt(previous_end.year(), previous_end.month(), 1)
            .ok_or(ValidationRule::InvalidPeriod)?;

        Ok(Self {
            month,
            year,
            start,
            end,
            previous_start,
            previous_end,
        })
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    fn previous_contains(&self, date: NaiveDate) -> bool {
        date >= self.previous_start && date <= self.previous_end
    }
}

/// Stateless aggregator over live ledger entries.
pub struct ReconciliationService;

impl ReconciliationService {
    /// Reconciles the money-in of one business day.
    ///
    /// Archived entries and entries on other days are ignored. `today` is the
    /// current date in the business timezone.
    #[must_use]
    pub fn daily(date: NaiveDate, entries: &[LedgerEntry], today: NaiveDate) -> DailyReport {
        let mut totals = MethodTotals::default();
        let mut record_count = 0;
        let mut unclassified_count = 0;
        let mut missing_evidence_count = 0;

        for entry in entries.iter().filter(|e| {
            !e.is_deleted() && e.direction == Direction::MoneyIn && e.transaction_date == date
        }) {
            totals.add(entry.payment_method, entry.amount);
            record_count += 1;
            if !entry.is_classified {
                unclassified_count += 1;
            }
            if entry.is_missing_evidence() {
                missing_evidence_count += 1;
            }
        }

        DailyReport {
            date,
            grand_total: totals.total(),
            totals,
            record_count,
            unclassified_count,
            missing_evidence_count,
            is_closed: date < today && unclassified_count == 0 && missing_evidence_count == 0,
            is_today: date == today,
        }
    }

    /// Reconciles a month against the month before it.
    ///
    /// `entries` must cover both months; anything outside them is ignored.
    /// The salary category is matched case-insensitively.
    #[must_use]
    pub fn monthly(
        period: &MonthPeriod,
        entries: &[LedgerEntry],
        client_names: &HashMap<ClientId, String>,
        salary_category: &str,
    ) -> MonthlyReport {
        let live = || entries.iter().filter(|e| !e.is_deleted());
        let current: Vec<&LedgerEntry> = live().filter(|e| period.contains(e.transaction_date)).collect();
        let previous: Vec<&LedgerEntry> = live()
            .filter(|e| period.previous_contains(e.transaction_date))
            .collect();

        let current_totals = Self::period_totals(&current, salary_category);
        let previous_totals = Self::period_totals(&previous, salary_category);

        MonthlyReport {
            month: period.month,
            year: period.year,
            period_start: period.start,
            period_end: period.end,
            categories: Self::category_breakdown(&current),
            clients: Self::client_breakdown(&current, client_names),
            comparison: MonthlyComparison {
                money_in: compare(current_totals.money_in, previous_totals.money_in),
                money_out: compare(current_totals.money_out, previous_totals.money_out),
                salary: compare(current_totals.salary, previous_totals.salary),
            },
            current: current_totals,
            previous: previous_totals,
        }
    }

    fn period_totals(entries: &[&LedgerEntry], salary_category: &str) -> PeriodTotals {
        let salary_category = salary_category.trim();
        entries.iter().fold(PeriodTotals::default(), |mut totals, entry| {
            match entry.direction {
                Direction::MoneyIn => totals.money_in += entry.amount,
                Direction::MoneyOut => {
                    let is_salary = entry
                        .source
                        .as_deref()
                        .is_some_and(|s| s.trim().eq_ignore_ascii_case(salary_category));
                    if is_salary {
                        totals.salary += entry.amount;
                    } else {
                        totals.money_out += entry.amount;
                    }
                }
            }
            totals
        })
    }

    fn category_breakdown(entries: &[&LedgerEntry]) -> Vec<CategoryBreakdown> {
        let mut groups: HashMap<String, (Decimal, u64)> = HashMap::new();
        let mut money_out = Decimal::ZERO;

        for entry in entries.iter().filter(|e| e.direction == Direction::MoneyOut) {
            let category = entry
                .source
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or_else(|| UNCATEGORIZED.to_string(), str::to_lowercase);
            let slot = groups.entry(category).or_default();
            slot.0 += entry.amount;
            slot.1 += 1;
            money_out += entry.amount;
        }

        let mut breakdown: Vec<CategoryBreakdown> = groups
            .into_iter()
            .map(|(category, (total, count))| CategoryBreakdown {
                category,
                total,
                count,
                percentage: percentage_of(total, money_out),
            })
            .collect();
        breakdown.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
        breakdown
    }

    fn client_breakdown(
        entries: &[&LedgerEntry],
        client_names: &HashMap<ClientId, String>,
    ) -> Vec<ClientBreakdown> {
        let mut groups: HashMap<Option<ClientId>, (Decimal, u64)> = HashMap::new();
        let mut money_in = Decimal::ZERO;

        for entry in entries.iter().filter(|e| e.direction == Direction::MoneyIn) {
            let slot = groups.entry(entry.client_id).or_default();
            slot.0 += entry.amount;
            slot.1 += 1;
            money_in += entry.amount;
        }

        let mut breakdown: Vec<ClientBreakdown> = groups
            .into_iter()
            .map(|(client_id, (total, count))| ClientBreakdown {
                client_id,
                client_name: client_id.map_or_else(
                    || UNASSIGNED_CLIENT.to_string(),
                    |id| {
                        client_names
                            .get(&id)
                            .cloned()
                            .unwrap_or_else(|| format!("Client {id}"))
                    },
                ),
                total,
                count,
                percentage: percentage_of(total, money_in),
            })
            .collect();
        breakdown.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.client_name.cmp(&b.client_name))
        });
        breakdown
    }
}

/// Compares one figure against its previous-month value.
///
/// With no previous value the change is 0% if there is still nothing, else 100%.
#[must_use]
pub fn compare(current: Decimal, previous: Decimal) -> PeriodComparison {
    let difference = current - previous;
    let percentage_change = if previous.is_zero() {
        if current.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        }
    } else {
        percentage_of(difference, previous)
    };
    let trend = if percentage_change > TREND_DEADBAND {
        Trend::Increase
    } else if percentage_change < -TREND_DEADBAND {
        Trend::Decrease
    } else {
        Trend::Stable
    };

    PeriodComparison {
        current,
        previous,
        difference,
        percentage_change,
        trend,
    }
}
