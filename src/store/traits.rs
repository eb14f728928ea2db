//! Event store trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Result, ValidationError};
use crate::event::{DateRange, EventFilter, EventStatus, FinancialEvent, ObligationKind};

use super::cancel::CancelToken;

/// Extra data carried by a mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutateExtra {
    /// Settlement date for a transition into a settled state. Defaults to
    /// today when absent.
    pub settled_date: Option<NaiveDate>,
}

impl MutateExtra {
    /// Carry an explicit settlement date.
    pub fn settled_on(date: NaiveDate) -> Self {
        Self {
            settled_date: Some(date),
        }
    }
}

/// Query/mutation boundary over persisted obligation records.
///
/// Implementations enrich every returned event with its derived fields
/// (`is_overdue`, `days_until_due`) before it leaves the store, and write
/// exactly one record per `mutate` call.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Fetch events for a unit within an inclusive date range, restricted by
    /// the filter's allow-lists. Fails with a validation error when `unit_id`
    /// is empty or the range is inverted.
    ///
    /// The cancellation token is cooperative: an implementation may abandon
    /// work early when it is cancelled, but the caller remains responsible
    /// for discarding a stale result.
    async fn query(
        &self,
        unit_id: &str,
        range: DateRange,
        filter: &EventFilter,
        cancel: &CancelToken,
    ) -> Result<Vec<FinancialEvent>>;

    /// Write one record's status. A transition into a settled state stamps
    /// the settlement date from `extra` (today when absent); a transition
    /// out of one clears it. No other field is touched.
    async fn mutate(
        &self,
        id: &str,
        kind: ObligationKind,
        status: EventStatus,
        extra: MutateExtra,
    ) -> Result<()>;
}

/// Validate the required query parameters. Shared by store implementations.
pub fn validate_query(unit_id: &str, range: &DateRange) -> Result<()> {
    if unit_id.trim().is_empty() {
        return Err(ValidationError::MissingUnit.into());
    }
    if range.is_inverted() {
        return Err(ValidationError::EmptyRange {
            start: range.start,
            end: range.end,
        }
        .into());
    }
    Ok(())
}

/// Stamp the derived read-only fields on a batch of events as of `today`.
pub fn enrich_events(events: &mut [FinancialEvent], today: NaiveDate) {
    for event in events {
        event.enrich(today);
    }
}
