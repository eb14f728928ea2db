//! Date ranges and query filters for event lookups.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{EventStatus, FinancialEvent, ObligationKind};

// ============================================================================
// Date Range
// ============================================================================

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range. Bounds are inclusive on both ends.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The full calendar month `(year, month)`, or `None` for an invalid month.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year, 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()?
        };
        Some(Self { start, end })
    }

    /// The full calendar year.
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// Whether `date` falls within the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Whether the range is inverted (ends before it starts).
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

// ============================================================================
// Event Filter
// ============================================================================

/// Filter criteria for event queries.
///
/// `kinds` and `statuses` are allow-lists; an empty list means "all".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Restrict to one bank account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Allowed obligation kinds; empty means all.
    #[serde(default)]
    pub kinds: Vec<ObligationKind>,
    /// Allowed statuses; empty means all.
    #[serde(default)]
    pub statuses: Vec<EventStatus>,
}

impl EventFilter {
    /// A filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to an account.
    pub fn for_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Add an obligation kind to the allow-list.
    pub fn with_kind(mut self, kind: ObligationKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Add a status to the allow-list.
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Check if an event matches this filter.
    pub fn matches(&self, event: &FinancialEvent) -> bool {
        if let Some(ref account_id) = self.account_id {
            if event.account_id.as_ref() != Some(account_id) {
                return false;
            }
        }

        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }

        if !self.statuses.is_empty() && !self.statuses.contains(&event.status) {
            return false;
        }

        true
    }

    /// Stable serialization of the filter for cache keys. Allow-lists are
    /// sorted so two filters with the same sets produce the same key.
    pub fn cache_key(&self) -> String {
        let mut kinds: Vec<&str> = self.kinds.iter().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        kinds.dedup();

        let mut statuses: Vec<&str> = self.statuses.iter().map(|s| s.as_str()).collect();
        statuses.sort_unstable();
        statuses.dedup();

        format!(
            "acct={};kinds={};statuses={}",
            self.account_id.as_deref().unwrap_or("*"),
            kinds.join(","),
            statuses.join(",")
        )
    }
}
