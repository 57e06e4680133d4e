//! The in-memory metrics cache.
//!
//! Created once at startup and shared across request tasks via `Arc`.
//! Every counter is an atomic, so no lock guards the cache as a whole.

use super::commands::{CommandCount, CommandCounters, CounterPath};
use crate::schema::CommandSchema;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Handled/unhandled error totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorCounts {
    pub handled: u64,
    pub unhandled: u64,
}

/// Point-in-time view of the whole cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub started_at: DateTime<Utc>,
    pub taken_at: DateTime<Utc>,
    pub guilds: u64,
    pub members: u64,
    pub errors: ErrorCounts,
    pub events: BTreeMap<String, u64>,
    pub commands: BTreeMap<String, CommandCount>,
}

/// Process-wide analytics counters.
#[derive(Debug)]
pub struct MetricsCache {
    started_at: DateTime<Utc>,
    guilds: AtomicU64,
    members: AtomicU64,
    errors_handled: AtomicU64,
    errors_unhandled: AtomicU64,
    events: HashMap<String, AtomicU64>,
    commands: CommandCounters,
}

impl MetricsCache {
    /// Build a zeroed cache for the given schema and event catalog.
    pub fn new<I, S>(schema: &CommandSchema, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            started_at: Utc::now(),
            guilds: AtomicU64::new(0),
            members: AtomicU64::new(0),
            errors_handled: AtomicU64::new(0),
            errors_unhandled: AtomicU64::new(0),
            events: events
                .into_iter()
                .map(|name| (name.into(), AtomicU64::new(0)))
                .collect(),
            commands: CommandCounters::from_schema(schema),
        }
    }

    /// Record the latest reported guild count.
    pub fn set_guild_count(&self, count: u64) -> u64 {
        self.guilds.store(count, Ordering::Relaxed);
        count
    }

    /// Record the latest reported member count.
    pub fn set_member_count(&self, count: u64) -> u64 {
        self.members.store(count, Ordering::Relaxed);
        count
    }

    /// Count one error and return the updated totals.
    pub fn record_error(&self, handled: bool) -> ErrorCounts {
        if handled {
            self.errors_handled.fetch_add(1, Ordering::Relaxed);
        } else {
            self.errors_unhandled.fetch_add(1, Ordering::Relaxed);
        }
        self.error_counts()
    }

    pub fn error_counts(&self) -> ErrorCounts {
        ErrorCounts {
            handled: self.errors_handled.load(Ordering::Relaxed),
            unhandled: self.errors_unhandled.load(Ordering::Relaxed),
        }
    }

    pub fn is_known_event(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    /// Count one gateway event. `None` if the event is not in the catalog.
    pub fn record_event(&self, event: &str) -> Option<u64> {
        self.events
            .get(event)
            .map(|counter| counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Count one command use at `path`. `None` if the path does not exist.
    pub fn increment_command(&self, path: &CounterPath) -> Option<u64> {
        self.commands.increment(path)
    }

    #[cfg(test)]
    pub fn command_count(&self, path: &CounterPath) -> Option<u64> {
        self.commands.get(path)
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            started_at: self.started_at,
            taken_at: Utc::now(),
            guilds: self.guilds.load(Ordering::Relaxed),
            members: self.members.load(Ordering::Relaxed),
            errors: self.error_counts(),
            events: self
                .events
                .iter()
                .map(|(name, count)| (name.clone(), count.load(Ordering::Relaxed)))
                .collect(),
            commands: self.commands.snapshot(),
        }
    }
}
