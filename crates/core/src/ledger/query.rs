//! Ledger listing: filters, ordering and the filtered-set summary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use guardbook_shared::types::{ClientId, PageMeta, PageRequest};

use super::types::{Direction, LedgerEntry, PaymentMethod};

/// Criteria for listing ledger entries. Unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    /// Inclusive lower bound on the transaction date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the transaction date.
    pub date_to: Option<NaiveDate>,
    /// Exact payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Exact source or category, compared case-insensitively.
    pub source: Option<String>,
    /// Linked client.
    pub client_id: Option<ClientId>,
    /// Money-in or money-out.
    pub direction: Option<Direction>,
    /// Inclusive lower bound on the amount.
    pub min_amount: Option<Decimal>,
    /// Inclusive upper bound on the amount.
    pub max_amount: Option<Decimal>,
    /// Case-insensitive substring over description, reference, receipt and notes.
    pub search: Option<String>,
}

impl EntryFilter {
    /// Returns true if `entry` passes every set criterion.
    ///
    /// Tombstones are not considered here.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.date_from.is_none_or(|d| entry.transaction_date >= d)
            && self.date_to.is_none_or(|d| entry.transaction_date <= d)
            && self.payment_method.is_none_or(|m| entry.payment_method == m)
            && self.direction.is_none_or(|d| entry.direction == d)
            && self.client_id.is_none_or(|c| entry.client_id == Some(c))
            && self.min_amount.is_none_or(|min| entry.amount >= min)
            && self.max_amount.is_none_or(|max| entry.amount <= max)
            && self.matches_source(entry)
            && self.matches_search(entry)
    }

    fn matches_source(&self, entry: &LedgerEntry) -> bool {
        match self.source.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => entry
                .source
                .as_deref()
                .is_some_and(|s| s.trim().eq_ignore_ascii_case(wanted)),
        }
    }

    fn matches_search(&self, entry: &LedgerEntry) -> bool {
        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        [
            entry.description.as_deref(),
            entry.reference_number.as_deref(),
            entry.receipt_number.as_deref(),
            entry.notes.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|haystack| haystack.to_lowercase().contains(&needle))
    }
}

/// Per-payment-method totals. Every method is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTotals {
    /// Cash total.
    pub cash: Decimal,
    /// Bank transfer total.
    pub bank_transfer: Decimal,
    /// Cheque total.
    pub cheque: Decimal,
    /// Mobile money total.
    pub mobile_money: Decimal,
    /// POS total.
    pub pos: Decimal,
    /// Other total.
    pub other: Decimal,
}

impl MethodTotals {
    /// Adds `amount` to the bucket for `method`.
    pub fn add(&mut self, method: PaymentMethod, amount: Decimal) {
        let bucket = match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::BankTransfer => &mut self.bank_transfer,
            PaymentMethod::Cheque => &mut self.cheque,
            PaymentMethod::MobileMoney => &mut self.mobile_money,
            PaymentMethod::Pos => &mut self.pos,
            PaymentMethod::Other => &mut self.other,
        };
        *bucket += amount;
    }

    /// Reads the bucket for `method`.
    #[must_use]
    pub fn get(&self, method: PaymentMethod) -> Decimal {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::BankTransfer => self.bank_transfer,
            PaymentMethod::Cheque => self.cheque,
            PaymentMethod::MobileMoney => self.mobile_money,
            PaymentMethod::Pos => self.pos,
            PaymentMethod::Other => self.other,
        }
    }

    /// Sum over every bucket.
    #[must_use]
    pub fn total(&self) -> Decimal {
        PaymentMethod::ALL.iter().map(|m| self.get(*m)).sum()
    }
}

/// Summary over the whole filtered set, not just the returned page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    /// Sum of all amounts.
    pub total: Decimal,
    /// Number of entries.
    pub count: u64,
    /// Totals per payment method.
    pub by_payment_method: MethodTotals,
    /// Entries without a source or category.
    pub unclassified_count: u64,
}

impl LedgerSummary {
    /// Summarizes `entries`.
    #[must_use]
    pub fn from_entries(entries: &[LedgerEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut summary, entry| {
            summary.total += entry.amount;
            summary.count += 1;
            summary.by_payment_method.add(entry.payment_method, entry.amount);
            if !entry.is_classified {
                summary.unclassified_count += 1;
            }
            summary
        })
    }
}

/// One page of entries plus the filtered-set summary.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Entries on this page.
    pub records: Vec<LedgerEntry>,
    /// Pagination metadata.
    pub pagination: PageMeta,
    /// Summary over every matching live entry.
    pub summary: LedgerSummary,
}

/// Sorts newest business date first, then newest creation first.
pub fn sort_newest_first(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| {
        b.transaction_date
            .cmp(&a.transaction_date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Builds the page for `request` from the already-filtered `entries`.
///
/// The summary only counts live entries even when archived ones are listed.
#[must_use]
pub fn paginate(mut entries: Vec<LedgerEntry>, request: PageRequest) -> QueryResult {
    sort_newest_first(&mut entries);
    let live: Vec<LedgerEntry> = entries.iter().filter(|e| !e.is_deleted()).cloned().collect();
    let summary = LedgerSummary::from_entries(&live);
    let total = entries.len() as u64;
    QueryResult {
        records: request.slice(entries),
        pagination: PageMeta::new(request, total),
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::Tombstone;
    use chrono::{Duration, Utc};
    use guardbook_shared::types::{Currency, LedgerEntryId, UserId};
    use rust_decimal_macros::dec;

    fn entry(day: u32, amount: Decimal, method: PaymentMethod) -> LedgerEntry {
        let now = Utc::now();
        LedgerEntry {
            id: LedgerEntryId::new(),
            direction: Direction::MoneyIn,
            amount,
            currency: Currency::Ngn,
            transaction_date: NaiveDate::from_ymd_opt(2026, 5, day).unwrap(),
            payment_method: method,
            source: Some("client".into()),
            description: None,
            client_id: None,
            invoice_id: None,
            receipt_number: None,
            reference_number: None,
            bank_name: None,
            account_name: None,
            notes: None,
            attachments: vec!["scan.pdf".into()],
            is_classified: true,
            created_by: UserId::new(),
            created_at: now,
            updated_at: now,
            edit_history: vec![],
            deletion: None,
        }
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut e = entry(1, dec!(100), PaymentMethod::Cash);
        e.notes = Some("Paid by Site Supervisor at Ikeja".into());
        let filter = EntryFilter {
            search: Some("ikeja".into()),
            ..EntryFilter::default()
        };
        assert!(filter.matches(&e));

        e.notes = None;
        e.reference_number = Some("TRF-99812".into());
        let filter = EntryFilter {
            search: Some("trf-998".into()),
            ..EntryFilter::default()
        };
        assert!(filter.matches(&e));

        let filter = EntryFilter {
            search: Some("lekki".into()),
            ..EntryFilter::default()
        };
        assert!(!filter.matches(&e));
    }

    #[test]
    fn test_amount_and_date_ranges_are_inclusive() {
        let e = entry(10, dec!(500), PaymentMethod::Pos);
        let filter = EntryFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 5, 10),
            date_to: NaiveDate::from_ymd_opt(2026, 5, 10),
            min_amount: Some(dec!(500)),
            max_amount: Some(dec!(500)),
            ..EntryFilter::default()
        };
        assert!(filter.matches(&e));

        let filter = EntryFilter {
            min_amount: Some(dec!(500.01)),
            ..EntryFilter::default()
        };
        assert!(!filter.matches(&e));
    }

    #[test]
    fn test_paginate_sorts_and_summarizes_whole_set() {
        let older = entry(1, dec!(100), PaymentMethod::Cash);
        let mut same_day_first = entry(5, dec!(200), PaymentMethod::Pos);
        same_day_first.created_at -= Duration::minutes(5);
        let mut same_day_second = entry(5, dec!(300), PaymentMethod::Pos);
        same_day_second.is_classified = false;
        same_day_second.source = None;

        let result = paginate(
            vec![older.clone(), same_day_first.clone(), same_day_second.clone()],
            PageRequest::new(1, 2),
        );

        let ids: Vec<_> = result.records.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![same_day_second.id, same_day_first.id]);
        assert_eq!(result.pagination.total, 3);
        assert_eq!(result.pagination.total_pages, 2);
        assert_eq!(result.summary.total, dec!(600));
        assert_eq!(result.summary.count, 3);
        assert_eq!(result.summary.unclassified_count, 1);
        assert_eq!(result.summary.by_payment_method.pos, dec!(500));
        assert_eq!(result.summary.by_payment_method.cheque, dec!(0));
    }

    #[test]
    fn test_summary_skips_archived_records() {
        let live = entry(1, dec!(100), PaymentMethod::Cash);
        let mut archived = entry(2, dec!(900), PaymentMethod::Cash);
        archived.deletion = Some(Tombstone {
            deleted_at: Utc::now(),
            deleted_by: UserId::new(),
            reason: "duplicate".into(),
        });

        let result = paginate(vec![live, archived], PageRequest::default());
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.summary.total, dec!(100));
        assert_eq!(result.summary.count, 1);
    }
}
