//! Engine configuration.

mod settings;

pub use settings::{CacheConfig, Config, ReconcileConfig};
