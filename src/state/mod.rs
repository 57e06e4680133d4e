//! State management module.
//!
//! Contains the metrics cache (shared analytics counters) and the nested
//! command counter tree it owns.

mod cache;
mod commands;

pub use cache::{CacheSnapshot, MetricsCache};
pub use commands::CounterPath;
