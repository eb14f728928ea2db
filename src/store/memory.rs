//! In-memory event store.
//!
//! The embedded backend used by tests and by callers that do not need a
//! remote persistence service. Behaves exactly like a remote store at the
//! trait boundary: validation, enrichment, and single-record mutation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::event::{DateRange, EventFilter, EventStatus, FinancialEvent, ObligationKind};

use super::cancel::CancelToken;
use super::traits::{enrich_events, validate_query, EventStore, MutateExtra};

type EventKey = (ObligationKind, String);

/// An `EventStore` backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<EventKey, FinancialEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an event. Validates the event's own invariants and
    /// rejects a replacement that would move the event to another unit
    /// (ownership is immutable after creation).
    pub async fn insert(&self, event: FinancialEvent) -> Result<()> {
        event.validate()?;
        let mut events = self.events.write().await;
        let key = (event.kind, event.id.clone());
        if let Some(existing) = events.get(&key) {
            if existing.unit_id != event.unit_id {
                return Err(StoreError::UnitMismatch(event.id).into());
            }
        }
        events.insert(key, event);
        Ok(())
    }

    /// Fetch a single event by kind and id.
    pub async fn get(&self, kind: ObligationKind, id: &str) -> Option<FinancialEvent> {
        self.events
            .read()
            .await
            .get(&(kind, id.to_string()))
            .cloned()
    }

    /// Number of stored events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn query(
        &self,
        unit_id: &str,
        range: DateRange,
        filter: &EventFilter,
        _cancel: &CancelToken,
    ) -> Result<Vec<FinancialEvent>> {
        validate_query(unit_id, &range)?;

        let events = self.events.read().await;
        let mut matched: Vec<FinancialEvent> = events
            .values()
            .filter(|e| e.unit_id == unit_id)
            .filter(|e| range.contains(e.calendar_date()))
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        drop(events);

        matched.sort_by(|a, b| {
            a.calendar_date()
                .cmp(&b.calendar_date())
                .then_with(|| a.id.cmp(&b.id))
        });

        enrich_events(&mut matched, Utc::now().date_naive());
        Ok(matched)
    }

    async fn mutate(
        &self,
        id: &str,
        kind: ObligationKind,
        status: EventStatus,
        extra: MutateExtra,
    ) -> Result<()> {
        let mut events = self.events.write().await;
        let event = events
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if event.status.is_terminal() && status != event.status {
            return Err(StoreError::InvalidTransition {
                from: event.status,
                to: status,
            }
            .into());
        }

        if status.is_settled_state() {
            event.actual_date = extra
                .settled_date
                .or(event.actual_date)
                .or_else(|| Some(Utc::now().date_naive()));
        } else {
            event.actual_date = None;
        }
        let previous = event.status;
        event.status = status;

        debug!(%id, %kind, from = %previous, to = %status, "mutated event status");
        Ok(())
    }
}
