//! Status self-healing for loaded event batches.
//!
//! Planning is pure: given a batch and a reference date, compute the minimal
//! set of corrections that makes every receivable/payable status agree with
//! its due date. Application is sequential and tolerates per-item failures,
//! so one bad record never aborts the batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::{EventStatus, FinancialEvent, ObligationKind};
use crate::store::{EventStore, MutateExtra};

/// A single planned status correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub id: String,
    pub kind: ObligationKind,
    pub from: EventStatus,
    pub to: EventStatus,
    /// Settlement date stamped on a promotion into `Settled`. Assumes
    /// on-time settlement: equal to the event's due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_date: Option<NaiveDate>,
}

/// One correction that could not be applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCorrection {
    pub id: String,
    pub error: String,
}

/// Outcome of applying a correction batch. Failures are data, not errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Number of corrections applied.
    pub corrected: usize,
    /// Corrections that failed, in batch order.
    pub failed: Vec<FailedCorrection>,
}

impl ReconcileReport {
    /// Whether every planned correction was applied.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The status a receivable/payable should have as of `today`, or `None`
/// when the event is exempt or already correct.
///
/// Cancelled and reconciled events are never touched, and the date rule is
/// defined only for receivables and payables. For everything else the
/// correct status is `Settled` once the due date has arrived, `Pending`
/// before it — deliberately overriding whatever was persisted.
pub fn expected_status(event: &FinancialEvent, today: NaiveDate) -> Option<EventStatus> {
    if event.kind == ObligationKind::Compensation {
        return None;
    }
    if matches!(
        event.status,
        EventStatus::Cancelled | EventStatus::Reconciled
    ) {
        return None;
    }

    let correct = if event.expected_date <= today {
        EventStatus::Settled
    } else {
        EventStatus::Pending
    };

    (correct != event.status).then_some(correct)
}

/// Plan the minimal correction set for a batch of events.
pub fn plan_corrections(events: &[FinancialEvent], today: NaiveDate) -> Vec<Correction> {
    events
        .iter()
        .filter_map(|event| {
            let to = expected_status(event, today)?;
            Some(Correction {
                id: event.id.clone(),
                kind: event.kind,
                from: event.status,
                to,
                actual_date: (to == EventStatus::Settled).then_some(event.expected_date),
            })
        })
        .collect()
}

/// Apply corrections one at a time against the store.
///
/// Each item is its own suspension point; a failure is logged and recorded,
/// and the loop continues with the next item.
pub async fn apply_corrections(
    store: &dyn EventStore,
    corrections: &[Correction],
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for correction in corrections {
        let extra = match correction.actual_date {
            Some(date) => MutateExtra::settled_on(date),
            None => MutateExtra::default(),
        };
        match store
            .mutate(&correction.id, correction.kind, correction.to, extra)
            .await
        {
            Ok(()) => {
                debug!(
                    id = %correction.id,
                    from = %correction.from,
                    to = %correction.to,
                    "corrected event status"
                );
                report.corrected += 1;
            }
            Err(err) => {
                warn!(
                    id = %correction.id,
                    error = %err,
                    "status correction failed; continuing with batch"
                );
                report.failed.push(FailedCorrection {
                    id: correction.id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    report
}
