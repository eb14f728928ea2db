//! Query result cache for calendar views.
//!
//! One cache per controller instance, keyed by the full query tuple
//! (unit, date range, filters) and bounded by a constructor-supplied TTL.
//! Invalidation is all-or-nothing: obligations can shift across date ranges,
//! so any mutation clears every entry.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use crate::config::CacheConfig;
use crate::event::{DateRange, EventFilter, FinancialEvent};

/// Default time-to-live for cached query results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// TTL-bounded cache of query results for one viewer.
pub struct CalendarCache {
    entries: Cache<String, Arc<Vec<FinancialEvent>>>,
    enabled: bool,
}

impl CalendarCache {
    /// Create a cache with the given TTL and a default capacity.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, 256)
    }

    /// Create a cache with explicit TTL and capacity.
    pub fn with_capacity(ttl: Duration, max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
            enabled: true,
        }
    }

    /// Build a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self::with_capacity(Duration::from_secs(config.ttl_secs), config.max_entries)
    }

    /// A cache that never stores and always misses.
    pub fn disabled() -> Self {
        Self {
            entries: Cache::builder().max_capacity(0).build(),
            enabled: false,
        }
    }

    /// Deterministic key for a query tuple. Filter allow-lists serialize in
    /// a stable order, so logically equal queries share an entry.
    pub fn key(unit_id: &str, range: &DateRange, filter: &EventFilter) -> String {
        format!(
            "{}|{}|{}|{}",
            unit_id,
            range.start,
            range.end,
            filter.cache_key()
        )
    }

    /// Look up a result. A hit past the TTL is a miss.
    pub fn get(&self, key: &str) -> Option<Arc<Vec<FinancialEvent>>> {
        if !self.enabled {
            return None;
        }
        let hit = self.entries.get(key);
        debug!(key, hit = hit.is_some(), "calendar cache lookup");
        hit
    }

    /// Store a result under a key.
    pub fn insert(&self, key: String, events: Arc<Vec<FinancialEvent>>) {
        if !self.enabled {
            return;
        }
        self.entries.insert(key, events);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        debug!("calendar cache cleared");
    }

    /// Number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl Default for CalendarCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
