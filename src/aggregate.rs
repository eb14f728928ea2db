//! Pure summary derivations over flat event lists.
//!
//! Everything here is a function of the input set: no I/O, no clock, and
//! output independent of the input ordering. Overdue information comes from
//! the `is_overdue` flag the store stamped at read time.
//!
//! Bucketing rules: an event belongs to its settlement date when money has
//! moved, to its due date otherwise; `Settled`/`Reconciled` feed the settled
//! totals, `Pending`/`Overdue` the planned ones; `Cancelled` events are
//! counted but contribute no amounts.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::event::{DateRange, EventStatus, FinancialEvent, ObligationKind};

// ============================================================================
// Summary Types
// ============================================================================

/// Totals and counts for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub receivable_total: Decimal,
    pub payable_total: Decimal,
    pub compensation_total: Decimal,
    /// `receivable_total - payable_total`.
    pub net_balance: Decimal,
    pub receivable_count: usize,
    pub payable_count: usize,
    pub compensation_count: usize,
}

/// One month's totals within a year. `month` is 0-based (0 = January).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: u32,
    pub planned_receivable: Decimal,
    pub settled_receivable: Decimal,
    pub planned_payable: Decimal,
    pub settled_payable: Decimal,
    pub overdue_count: usize,
}

/// Totals for one `(category, status)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub status: EventStatus,
    pub count: usize,
    pub total_amount: Decimal,
}

/// Overall totals for a queried range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_events: usize,
    pub receivables_planned: Decimal,
    pub receivables_settled: Decimal,
    pub payables_planned: Decimal,
    pub payables_settled: Decimal,
    /// `(planned + settled) receivables - (planned + settled) payables`.
    pub projected_balance: Decimal,
    /// `settled receivables - settled payables`.
    pub settled_balance: Decimal,
    pub overdue_count: usize,
}

/// Category label used for events without one.
pub const UNCATEGORIZED: &str = "uncategorized";

// ============================================================================
// Aggregation Functions
// ============================================================================

/// Events whose calendar date falls within `range`.
pub fn events_in_range(events: &[FinancialEvent], range: DateRange) -> Vec<FinancialEvent> {
    events
        .iter()
        .filter(|e| range.contains(e.calendar_date()))
        .cloned()
        .collect()
}

/// Totals and counts for all events on one day.
pub fn daily_summary(events: &[FinancialEvent], date: NaiveDate) -> DailySummary {
    let mut summary = DailySummary {
        date,
        receivable_total: Decimal::ZERO,
        payable_total: Decimal::ZERO,
        compensation_total: Decimal::ZERO,
        net_balance: Decimal::ZERO,
        receivable_count: 0,
        payable_count: 0,
        compensation_count: 0,
    };

    for event in events.iter().filter(|e| e.calendar_date() == date) {
        let amount = if event.status.is_terminal() {
            Decimal::ZERO
        } else {
            event.amount
        };
        match event.kind {
            ObligationKind::Receivable => {
                summary.receivable_total += amount;
                summary.receivable_count += 1;
            }
            ObligationKind::Payable => {
                summary.payable_total += amount;
                summary.payable_count += 1;
            }
            ObligationKind::Compensation => {
                summary.compensation_total += amount;
                summary.compensation_count += 1;
            }
        }
    }

    summary.net_balance = summary.receivable_total - summary.payable_total;
    summary
}

/// Twelve month buckets (index 0–11) for the given year.
pub fn monthly_summary(events: &[FinancialEvent], year: i32) -> Vec<MonthlyBucket> {
    let mut buckets: Vec<MonthlyBucket> = (0..12)
        .map(|month| MonthlyBucket {
            month,
            ..MonthlyBucket::default()
        })
        .collect();

    for event in events {
        let date = event.calendar_date();
        if date.year() != year {
            continue;
        }
        let bucket = &mut buckets[date.month0() as usize];

        if event.is_overdue {
            bucket.overdue_count += 1;
        }
        if event.status.is_terminal() {
            continue;
        }

        let settled = event.status.is_settled_state();
        match event.kind {
            ObligationKind::Receivable if settled => bucket.settled_receivable += event.amount,
            ObligationKind::Receivable => bucket.planned_receivable += event.amount,
            ObligationKind::Payable if settled => bucket.settled_payable += event.amount,
            ObligationKind::Payable => bucket.planned_payable += event.amount,
            ObligationKind::Compensation => {}
        }
    }

    buckets
}

/// Counts and totals grouped by `(category, status)`, sorted by group key.
pub fn category_summary(events: &[FinancialEvent]) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<(String, EventStatus), (usize, Decimal)> = BTreeMap::new();

    for event in events {
        let category = event
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let entry = groups
            .entry((category, event.status))
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += event.amount;
    }

    groups
        .into_iter()
        .map(|((category, status), (count, total_amount))| CategorySummary {
            category,
            status,
            count,
            total_amount,
        })
        .collect()
}

/// Overall totals for a flat event list.
pub fn overall_summary(events: &[FinancialEvent]) -> OverallSummary {
    let mut summary = OverallSummary {
        total_events: events.len(),
        ..OverallSummary::default()
    };

    for event in events {
        if event.is_overdue {
            summary.overdue_count += 1;
        }
        if event.status.is_terminal() {
            continue;
        }

        let settled = event.status.is_settled_state();
        match event.kind {
            ObligationKind::Receivable if settled => summary.receivables_settled += event.amount,
            ObligationKind::Receivable => summary.receivables_planned += event.amount,
            ObligationKind::Payable if settled => summary.payables_settled += event.amount,
            ObligationKind::Payable => summary.payables_planned += event.amount,
            ObligationKind::Compensation => {}
        }
    }

    summary.projected_balance = (summary.receivables_planned + summary.receivables_settled)
        - (summary.payables_planned + summary.payables_settled);
    summary.settled_balance = summary.receivables_settled - summary.payables_settled;
    summary
}
