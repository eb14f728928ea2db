//! Obligo: Financial Obligation Lifecycle & Calendar Aggregation Engine
//!
//! Represents receivables, payables, and compensations as dated events,
//! keeps each event's status consistent with its due and settlement dates,
//! serves date-range queries through a TTL-bounded cache, and derives the
//! daily/monthly/category summaries that calendar and dashboard views need.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod reconcile;
pub mod store;

pub use aggregate::{
    category_summary, daily_summary, events_in_range, monthly_summary, overall_summary,
    CategorySummary, DailySummary, MonthlyBucket, OverallSummary, UNCATEGORIZED,
};
pub use cache::{CalendarCache, DEFAULT_TTL};
pub use config::{CacheConfig, Config, ReconcileConfig};
pub use controller::{ControllerSnapshot, EventLifecycleController, LoadState};
pub use error::{ConfigError, ObligoError, Result, StoreError, ValidationError};
pub use event::{DateRange, EventFilter, EventStatus, FinancialEvent, ObligationKind};
pub use reconcile::{
    apply_corrections, expected_status, plan_corrections, Correction, FailedCorrection,
    ReconcileReport,
};
pub use store::{
    enrich_events, validate_query, CancelSource, CancelToken, EventStore, MemoryEventStore,
    MutateExtra,
};
