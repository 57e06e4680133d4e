//! Nested command usage counters.
//!
//! The counter tree is built once from the [`CommandSchema`] and mirrors it
//! exactly: one `AtomicU64` per addressable leaf. The maps are never mutated
//! after construction, so concurrent increments on different paths never
//! contend and increments on the same path are a single `fetch_add`.

use crate::schema::{CommandKind, CommandSchema};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A fully resolved address of one command counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterPath {
    Command(String),
    Subcommand {
        command: String,
        subcommand: String,
    },
    Grouped {
        command: String,
        group: String,
        subcommand: String,
    },
}

impl fmt::Display for CounterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(command) => write!(f, "{command}"),
            Self::Subcommand {
                command,
                subcommand,
            } => write!(f, "{command}.{subcommand}"),
            Self::Grouped {
                command,
                group,
                subcommand,
            } => write!(f, "{command}.{group}.{subcommand}"),
        }
    }
}

#[derive(Debug)]
enum CounterNode {
    Leaf(AtomicU64),
    Direct(HashMap<String, AtomicU64>),
    Grouped(HashMap<String, HashMap<String, AtomicU64>>),
}

/// Serializable view of one command's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandCount {
    Leaf(u64),
    Direct(BTreeMap<String, u64>),
    Grouped(BTreeMap<String, BTreeMap<String, u64>>),
}

/// Usage counters for every command in a schema.
#[derive(Debug)]
pub struct CommandCounters {
    nodes: HashMap<String, CounterNode>,
}

fn zeroed<'a>(names: impl IntoIterator<Item = &'a String>) -> HashMap<String, AtomicU64> {
    names
        .into_iter()
        .map(|name| (name.clone(), AtomicU64::new(0)))
        .collect()
}

fn load_all(counters: &HashMap<String, AtomicU64>) -> BTreeMap<String, u64> {
    counters
        .iter()
        .map(|(name, count)| (name.clone(), count.load(Ordering::Relaxed)))
        .collect()
}

impl CommandCounters {
    /// Allocate a zeroed counter for every addressable path in `schema`.
    pub fn from_schema(schema: &CommandSchema) -> Self {
        let nodes = schema
            .iter()
            .map(|(name, kind)| {
                let node = match kind {
                    CommandKind::Leaf => CounterNode::Leaf(AtomicU64::new(0)),
                    CommandKind::DirectSubcommands(subs) => CounterNode::Direct(zeroed(subs)),
                    CommandKind::SubcommandGroups(groups) => CounterNode::Grouped(
                        groups
                            .iter()
                            .map(|(group, subs)| (group.clone(), zeroed(subs)))
                            .collect(),
                    ),
                };
                (name.to_string(), node)
            })
            .collect();
        Self { nodes }
    }

    /// Increment the counter at `path` and return its new value.
    ///
    /// Returns `None` when the path does not exist; paths are never created here.
    pub fn increment(&self, path: &CounterPath) -> Option<u64> {
        self.counter(path)
            .map(|counter| counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Current value at `path`.
    #[cfg(test)]
    pub fn get(&self, path: &CounterPath) -> Option<u64> {
        self.counter(path)
            .map(|counter| counter.load(Ordering::Relaxed))
    }

    fn counter(&self, path: &CounterPath) -> Option<&AtomicU64> {
        match (path, self.nodes.get(path_command(path))?) {
            (CounterPath::Command(_), CounterNode::Leaf(counter)) => Some(counter),
            (CounterPath::Subcommand { subcommand, .. }, CounterNode::Direct(subs)) => {
                subs.get(subcommand)
            }
            (
                CounterPath::Grouped {
                    group, subcommand, ..
                },
                CounterNode::Grouped(groups),
            ) => groups.get(group)?.get(subcommand),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, CommandCount> {
        self.nodes
            .iter()
            .map(|(name, node)| {
                let count = match node {
                    CounterNode::Leaf(counter) => CommandCount::Leaf(counter.load(Ordering::Relaxed)),
                    CounterNode::Direct(subs) => CommandCount::Direct(load_all(subs)),
                    CounterNode::Grouped(groups) => CommandCount::Grouped(
                        groups
                            .iter()
                            .map(|(group, subs)| (group.clone(), load_all(subs)))
                            .collect(),
                    ),
                };
                (name.clone(), count)
            })
            .collect()
    }
}

fn path_command(path: &CounterPath) -> &str {
    match path {
        CounterPath::Command(command)
        | CounterPath::Subcommand { command, .. }
        | CounterPath::Grouped { command, .. } => command,
    }
}
