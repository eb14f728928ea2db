//! Lifecycle orchestration for one calendar viewer.
//!
//! The controller ties the layers together: consult the cache, fetch from
//! the store, run the self-healing status pass on fresh receivables,
//! aggregate on demand, and invalidate-then-refetch around every mutation.
//! A generation-numbered cancellation token guarantees that a superseded
//! query can never overwrite newer state, whatever order results arrive in.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::aggregate::{
    self, CategorySummary, DailySummary, MonthlyBucket, OverallSummary,
};
use crate::cache::CalendarCache;
use crate::config::Config;
use crate::error::{ObligoError, Result, StoreError, ValidationError};
use crate::event::{DateRange, EventFilter, EventStatus, FinancialEvent, ObligationKind};
use crate::reconcile::{self, ReconcileReport};
use crate::store::{CancelSource, CancelToken, EventStore, MutateExtra};

// ============================================================================
// Viewer State
// ============================================================================

/// Load state of a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No query issued yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch finished (successfully or not).
    Ready,
}

/// Point-in-time view of a controller: the last good event list and the
/// latest error are exposed independently, so a failed fetch never erases
/// data the caller is still showing.
#[derive(Debug, Clone, Default)]
pub struct ControllerSnapshot {
    pub state: LoadState,
    pub events: Vec<FinancialEvent>,
    pub last_error: Option<Arc<ObligoError>>,
}

#[derive(Debug, Default)]
struct ViewerState {
    load: LoadState,
    events: Vec<FinancialEvent>,
    last_error: Option<Arc<ObligoError>>,
}

impl ViewerState {
    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.load,
            events: self.events.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct QueryParams {
    unit_id: String,
    range: DateRange,
    filter: EventFilter,
}

// ============================================================================
// Controller
// ============================================================================

/// Orchestrates queries, status self-healing, caching, and mutations for
/// one viewer. Owns its cache exclusively; drop the controller, drop the
/// cache.
pub struct EventLifecycleController<S: EventStore> {
    store: Arc<S>,
    cache: CalendarCache,
    tokens: CancelSource,
    auto_reconcile: bool,
    params: RwLock<Option<QueryParams>>,
    state: RwLock<ViewerState>,
}

impl<S: EventStore> EventLifecycleController<S> {
    /// Create a controller around a store with an injected cache.
    pub fn new(store: Arc<S>, cache: CalendarCache) -> Self {
        Self {
            store,
            cache,
            tokens: CancelSource::new(),
            auto_reconcile: true,
            params: RwLock::new(None),
            state: RwLock::new(ViewerState::default()),
        }
    }

    /// Create a controller configured from `Config`.
    pub fn from_config(store: Arc<S>, config: &Config) -> Self {
        let mut controller = Self::new(store, CalendarCache::from_config(&config.cache));
        controller.auto_reconcile = config.reconcile.auto;
        controller
    }

    /// Enable or disable the automatic status pass on fresh loads.
    pub fn with_auto_reconcile(mut self, enabled: bool) -> Self {
        self.auto_reconcile = enabled;
        self
    }

    /// Current viewer state.
    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.state.read().await.snapshot()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Load events for a unit, range, and filter set.
    ///
    /// Consults the cache first; on a miss, fetches, runs the automatic
    /// status pass over the fresh receivables, and populates the cache.
    /// Missing parameters fail fast; fetch failures are captured into the
    /// snapshot instead.
    pub async fn get_events(
        &self,
        unit_id: impl Into<String>,
        range: DateRange,
        filter: EventFilter,
    ) -> Result<ControllerSnapshot> {
        let params = QueryParams {
            unit_id: unit_id.into(),
            range,
            filter,
        };
        crate::store::validate_query(&params.unit_id, &params.range)?;
        *self.params.write().await = Some(params.clone());

        let token = self.tokens.issue();
        let key = CalendarCache::key(&params.unit_id, &params.range, &params.filter);

        if let Some(cached) = self.cache.get(&key) {
            let mut state = self.state.write().await;
            if !token.is_cancelled() {
                state.load = LoadState::Ready;
                state.events = cached.as_ref().clone();
                state.last_error = None;
            }
            return Ok(state.snapshot());
        }

        self.load(&params, &token, key).await
    }

    /// Force a fresh fetch with the current parameters, bypassing the cache
    /// and re-populating it on success.
    pub async fn refetch(&self) -> Result<ControllerSnapshot> {
        let params = self
            .params
            .read()
            .await
            .clone()
            .ok_or(ValidationError::NoActiveQuery)?;
        let token = self.tokens.issue();
        let key = CalendarCache::key(&params.unit_id, &params.range, &params.filter);
        self.load(&params, &token, key).await
    }

    /// Fetch, self-heal, cache, and publish. The token is checked before any
    /// state is touched, so a superseded fetch leaves no trace.
    async fn load(
        &self,
        params: &QueryParams,
        token: &CancelToken,
        key: String,
    ) -> Result<ControllerSnapshot> {
        {
            // Token checks happen under the state lock: a newer query's
            // token is issued before any of its state writes, so a stale
            // fetch can never interleave its own writes after them.
            let mut state = self.state.write().await;
            if token.is_cancelled() {
                return Ok(state.snapshot());
            }
            state.load = LoadState::Loading;
        }

        let mut events = match self
            .store
            .query(&params.unit_id, params.range, &params.filter, token)
            .await
        {
            Ok(events) => events,
            Err(err) => return self.capture_fetch_error(err, token).await,
        };
        if token.is_cancelled() {
            debug!("discarding superseded query result");
            return Ok(self.snapshot().await);
        }

        if self.auto_reconcile {
            let today = Utc::now().date_naive();
            let receivables: Vec<FinancialEvent> = events
                .iter()
                .filter(|e| e.kind == ObligationKind::Receivable)
                .cloned()
                .collect();
            let corrections = reconcile::plan_corrections(&receivables, today);
            if !corrections.is_empty() {
                let report =
                    reconcile::apply_corrections(self.store.as_ref(), &corrections).await;
                debug!(
                    corrected = report.corrected,
                    failed = report.failed.len(),
                    "automatic status pass finished"
                );
                self.cache.clear();

                events = match self
                    .store
                    .query(&params.unit_id, params.range, &params.filter, token)
                    .await
                {
                    Ok(fresh) => fresh,
                    Err(err) => return self.capture_fetch_error(err, token).await,
                };
                if token.is_cancelled() {
                    debug!("discarding superseded post-correction result");
                    return Ok(self.snapshot().await);
                }
            }
        }

        let mut state = self.state.write().await;
        if token.is_cancelled() {
            debug!("discarding superseded query result");
            return Ok(state.snapshot());
        }
        self.cache.insert(key, Arc::new(events.clone()));
        state.load = LoadState::Ready;
        state.events = events;
        state.last_error = None;
        Ok(state.snapshot())
    }

    /// Record a fetch failure in the snapshot, keeping the last good events.
    async fn capture_fetch_error(
        &self,
        err: ObligoError,
        token: &CancelToken,
    ) -> Result<ControllerSnapshot> {
        let mut state = self.state.write().await;
        if token.is_cancelled() {
            debug!("discarding error from superseded query");
            return Ok(state.snapshot());
        }
        warn!(error = %err, "fetch failed; keeping last good data");
        state.load = LoadState::Ready;
        state.last_error = Some(Arc::new(err));
        Ok(state.snapshot())
    }

    // ========================================================================
    // Mutation Commands
    // ========================================================================

    /// Mark an event settled, optionally on an explicit date (today when
    /// absent). Clears the cache and refetches on success.
    pub async fn mark_settled(
        &self,
        id: &str,
        settled_date: Option<NaiveDate>,
    ) -> Result<ControllerSnapshot> {
        self.mutate_status(
            id,
            EventStatus::Settled,
            MutateExtra { settled_date },
        )
        .await
    }

    /// Cancel an event. Terminal.
    pub async fn cancel(&self, id: &str) -> Result<ControllerSnapshot> {
        self.mutate_status(id, EventStatus::Cancelled, MutateExtra::default())
            .await
    }

    /// Mark an event reconciled against bank activity.
    pub async fn reconcile(&self, id: &str) -> Result<ControllerSnapshot> {
        self.mutate_status(id, EventStatus::Reconciled, MutateExtra::default())
            .await
    }

    async fn mutate_status(
        &self,
        id: &str,
        status: EventStatus,
        extra: MutateExtra,
    ) -> Result<ControllerSnapshot> {
        let kind = self
            .state
            .read()
            .await
            .events
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.kind)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        match self.store.mutate(id, kind, status, extra).await {
            Ok(()) => {
                self.cache.clear();
                self.refetch().await
            }
            Err(err) => {
                warn!(%id, error = %err, "mutation failed; keeping previous data");
                let mut state = self.state.write().await;
                state.last_error = Some(Arc::new(err));
                Ok(state.snapshot())
            }
        }
    }

    /// Apply the status rule to an explicit batch. Failures are collected in
    /// the report, never thrown; any applied correction invalidates the
    /// cache and triggers a refetch.
    pub async fn reconcile_batch(&self, events: &[FinancialEvent]) -> ReconcileReport {
        let today = Utc::now().date_naive();
        let corrections = reconcile::plan_corrections(events, today);
        if corrections.is_empty() {
            return ReconcileReport::default();
        }

        let report = reconcile::apply_corrections(self.store.as_ref(), &corrections).await;
        self.cache.clear();
        if let Err(err) = self.refetch().await {
            debug!(error = %err, "refetch after batch reconciliation skipped");
        }
        report
    }

    // ========================================================================
    // Summaries
    // ========================================================================

    /// Totals for one day of the current snapshot.
    pub async fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        aggregate::daily_summary(&self.state.read().await.events, date)
    }

    /// Twelve month buckets for a year of the current snapshot.
    pub async fn monthly_summary(&self, year: i32) -> Vec<MonthlyBucket> {
        aggregate::monthly_summary(&self.state.read().await.events, year)
    }

    /// Category totals within a range of the current snapshot.
    pub async fn category_summary(&self, range: DateRange) -> Vec<CategorySummary> {
        let events = aggregate::events_in_range(&self.state.read().await.events, range);
        aggregate::category_summary(&events)
    }

    /// Overall totals within a range of the current snapshot.
    pub async fn overall_summary(&self, range: DateRange) -> OverallSummary {
        let events = aggregate::events_in_range(&self.state.read().await.events, range);
        aggregate::overall_summary(&events)
    }

    /// Number of live cache entries, for diagnostics.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
