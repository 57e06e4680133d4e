//! Static command schema.
//!
//! Describes every command the bot can report usage for and how it is
//! addressed. A command has exactly one [`Shape`]:
//!
//! - [`Shape::Leaf`]: resolved by its name alone (`/ping`)
//! - [`Shape::DirectSubcommands`]: needs a subcommand (`/config set`)
//! - [`Shape::SubcommandGroups`]: needs a group and a subcommand (`/manage roles add`)
//!
//! The schema is loaded once at startup and never mutated afterwards.
//! All lookups are total: they return `false` rather than failing.

mod builtin;
mod loader;

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub use builtin::builtin;
pub use loader::SchemaFileError;

/// Schema construction and lookup errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("command name must not be empty")]
    EmptyCommandName,
    #[error("command {0} is declared more than once")]
    DuplicateCommand(String),
    #[error("command {0} declares both subcommands and subcommand groups")]
    AmbiguousShape(String),
    #[error("command {0} declares an empty subcommand list")]
    EmptySubcommands(String),
    #[error("command {0} declares an empty group table")]
    EmptyGroups(String),
    #[error("group {1} of command {0} has no subcommands")]
    EmptyGroup(String, String),
    #[error("command {0} contains an empty subcommand or group name")]
    EmptyName(String),
}

/// The data-free tag of a command's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Leaf,
    DirectSubcommands,
    SubcommandGroups,
}

/// How a command is addressed, with the names valid beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Leaf,
    DirectSubcommands(BTreeSet<String>),
    SubcommandGroups(BTreeMap<String, BTreeSet<String>>),
}

impl CommandKind {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Leaf => Shape::Leaf,
            Self::DirectSubcommands(_) => Shape::DirectSubcommands,
            Self::SubcommandGroups(_) => Shape::SubcommandGroups,
        }
    }
}

/// Immutable lookup table of known commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSchema {
    commands: BTreeMap<String, CommandKind>,
}

impl CommandSchema {
    /// Build a schema from `(name, kind)` entries, enforcing the shape invariants.
    pub fn new<I>(entries: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (String, CommandKind)>,
    {
        let mut commands = BTreeMap::new();
        for (name, kind) in entries {
            if name.is_empty() {
                return Err(SchemaError::EmptyCommandName);
            }
            check_kind(&name, &kind)?;
            if commands.contains_key(&name) {
                return Err(SchemaError::DuplicateCommand(name));
            }
            commands.insert(name, kind);
        }
        Ok(Self { commands })
    }

    pub fn is_known_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Shape of a known command.
    pub fn shape_of(&self, name: &str) -> Result<Shape, SchemaError> {
        self.commands
            .get(name)
            .map(CommandKind::shape)
            .ok_or_else(|| SchemaError::UnknownCommand(name.to_string()))
    }

    pub fn is_known_direct_subcommand(&self, command: &str, subcommand: &str) -> bool {
        matches!(
            self.commands.get(command),
            Some(CommandKind::DirectSubcommands(subs)) if subs.contains(subcommand)
        )
    }

    pub fn is_known_group(&self, command: &str, group: &str) -> bool {
        self.group(command, group).is_some()
    }

    pub fn is_known_subcommand_in_group(
        &self,
        command: &str,
        group: &str,
        subcommand: &str,
    ) -> bool {
        self.group(command, group)
            .is_some_and(|subs| subs.contains(subcommand))
    }

    /// Iterate all commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandKind)> {
        self.commands.iter().map(|(name, kind)| (name.as_str(), kind))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn group(&self, command: &str, group: &str) -> Option<&BTreeSet<String>> {
        match self.commands.get(command) {
            Some(CommandKind::SubcommandGroups(groups)) => groups.get(group),
            _ => None,
        }
    }
}

fn check_kind(name: &str, kind: &CommandKind) -> Result<(), SchemaError> {
    match kind {
        CommandKind::Leaf => Ok(()),
        CommandKind::DirectSubcommands(subs) => {
            if subs.is_empty() {
                return Err(SchemaError::EmptySubcommands(name.to_string()));
            }
            if subs.iter().any(String::is_empty) {
                return Err(SchemaError::EmptyName(name.to_string()));
            }
            Ok(())
        }
        CommandKind::SubcommandGroups(groups) => {
            if groups.is_empty() {
                return Err(SchemaError::EmptyGroups(name.to_string()));
            }
            for (group, subs) in groups {
                if group.is_empty() || subs.iter().any(String::is_empty) {
                    return Err(SchemaError::EmptyName(name.to_string()));
                }
                if subs.is_empty() {
                    return Err(SchemaError::EmptyGroup(name.to_string(), group.clone()));
                }
            }
            Ok(())
        }
    }
}
